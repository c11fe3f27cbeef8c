use std::cell::Cell;
use std::rc::Rc;

use gpui_tree_core::{
    DndPolicy, DraggingPosition, DropContext, DropLinePosition, HoverPosition, ItemId, LinearTree,
    TreeItem, TreeItems,
};
use pretty_assertions::assert_eq;

fn items() -> TreeItems {
    TreeItems::new(
        "root",
        [
            TreeItem::new("root", "root").children(["docs", "src", "README"]),
            TreeItem::new("docs", "docs").children(["guide"]),
            TreeItem::new("guide", "guide"),
            TreeItem::new("src", "src").folder(true),
            TreeItem::new("README", "README"),
        ],
    )
}

#[test]
fn flipping_the_predicate_flips_only_legality() {
    let items = items();
    let tree = LinearTree::build("tree", "root", &items, |_| true);
    let dragging = [ItemId::from("README")];
    let allow = Rc::new(Cell::new(false));

    let flag = allow.clone();
    let policy = DndPolicy::default().drop_predicate(move |_, position| {
        position.target_item().is_none_or(|id| id.as_str() != "src") || flag.get()
    });
    let cx = DropContext::new(&tree, &items, &policy, &dragging);
    // Rows: docs guide src README
    let on_src = HoverPosition::row(2, None);

    let classified = cx.classify(on_src);
    assert!(classified.is_some());
    assert_eq!(cx.resolve(on_src), None);

    allow.set(true);
    assert_eq!(cx.classify(on_src), classified);
    assert_eq!(cx.resolve(on_src), classified);

    allow.set(false);
    assert_eq!(cx.resolve(on_src), None);
}

#[test]
fn predicate_sees_dragged_items_and_position() {
    let items = items();
    let tree = LinearTree::build("tree", "root", &items, |_| true);
    let seen = Rc::new(Cell::new(0));
    let counter = seen.clone();
    let policy = DndPolicy::default().drop_predicate(move |dragging, position| {
        counter.set(counter.get() + 1);
        dragging == [ItemId::from("guide")] && position.tree_id().as_str() == "tree"
    });
    let dragging = [ItemId::from("guide")];
    let cx = DropContext::new(&tree, &items, &policy, &dragging);

    let position = cx.resolve(HoverPosition::row(3, Some(DropLinePosition::Bottom)));
    assert!(matches!(position, Some(DraggingPosition::BetweenItems { .. })));
    assert_eq!(seen.get(), 1);

    // A row drop on a leaf is refused by the flags; the predicate is not consulted.
    assert_eq!(cx.resolve(HoverPosition::row(3, None)), None);
    assert_eq!(seen.get(), 1);
}

#[test]
fn policy_loaded_from_json_drives_resolution() {
    let items = items();
    let tree = LinearTree::build("tree", "root", &items, |_| true);
    let policy: DndPolicy = serde_json::from_str(
        r#"{
            "can_reorder_items": false,
            "can_drop_on_folder": true,
            "can_drop_on_non_folder": false
        }"#,
    )
    .unwrap();
    let dragging = [ItemId::from("README")];
    let cx = DropContext::new(&tree, &items, &policy, &dragging);

    // Hovering the leaf "guide" lands on its folder.
    assert_eq!(
        cx.resolve(HoverPosition::row(1, None)),
        Some(DraggingPosition::Item {
            tree_id: "tree".into(),
            parent_item: "root".into(),
            target_item: "docs".into(),
            depth: 0,
            linear_index: 0,
        })
    );
    assert_eq!(
        cx.resolve(HoverPosition::row(1, Some(DropLinePosition::Top))),
        None
    );
}

#[test]
fn clearing_the_predicate_restores_flag_only_gate() {
    let items = items();
    let tree = LinearTree::build("tree", "root", &items, |_| true);
    let dragging = [ItemId::from("README")];
    let on_src = HoverPosition::row(2, None);

    let policy = DndPolicy::default().drop_predicate(|_, _| false);
    assert_eq!(DropContext::new(&tree, &items, &policy, &dragging).resolve(on_src), None);

    let policy = policy.clear_drop_predicate();
    assert!(!policy.has_drop_predicate());
    assert_eq!(
        DropContext::new(&tree, &items, &policy, &dragging).resolve(on_src),
        Some(DraggingPosition::Item {
            tree_id: "tree".into(),
            parent_item: "root".into(),
            target_item: "src".into(),
            depth: 0,
            linear_index: 2,
        })
    );
}

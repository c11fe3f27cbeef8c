use crate::hover::HoverPosition;
use crate::item::{ItemId, TreeDataProvider};
use crate::linear::LinearTree;
use crate::policy::DndPolicy;
use crate::position::{DraggingPosition, DropContext, DropLinePosition};

/// Every legal drop target of `tree`, in visual order, for keyboard driven drags.
///
/// Each row contributes its top edge, the row itself and its bottom edge, followed by the append
/// at the end of the root. Candidates go through the same classifier and policy gate as pointer
/// moves, so redirected targets show up once, at their first occurrence.
pub fn programmatic_positions<S>(
    tree: &LinearTree,
    items: &S,
    policy: &DndPolicy,
    dragging_items: &[ItemId],
) -> Vec<DraggingPosition>
where
    S: TreeDataProvider + ?Sized,
{
    let cx = DropContext::new(tree, items, policy, dragging_items);
    let mut positions: Vec<DraggingPosition> = Vec::new();
    let mut push = |position: Option<DraggingPosition>| {
        if let Some(position) = position
            && !positions.contains(&position)
        {
            positions.push(position);
        }
    };

    let Some(last_index) = tree.len().checked_sub(1) else {
        push(cx.resolve(HoverPosition::row(0, None)));
        return positions;
    };

    for linear_index in 0..tree.len() {
        for offset in [
            Some(DropLinePosition::Top),
            None,
            Some(DropLinePosition::Bottom),
        ] {
            push(cx.resolve(HoverPosition::row(linear_index, offset)));
        }
    }
    push(cx.resolve(HoverPosition::very_bottom(last_index)));

    positions
}

/// Index into `positions` of the target nearest to `linear_index`.
pub fn closest_position(positions: &[DraggingPosition], linear_index: usize) -> Option<usize> {
    positions
        .iter()
        .enumerate()
        .min_by_key(|(_, position)| position.linear_index().abs_diff(linear_index))
        .map(|(ix, _)| ix)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::item::{TreeItem, TreeItems};

    fn fixture() -> (TreeItems, LinearTree) {
        let items = TreeItems::new(
            "root",
            [
                TreeItem::new("root", "root").children(["A", "C"]),
                TreeItem::new("A", "A").children(["B"]),
                TreeItem::new("B", "B"),
                TreeItem::new("C", "C"),
            ],
        );
        let tree = LinearTree::build("t", "root", &items, |_| true);
        (items, tree)
    }

    fn between(
        parent: &str,
        depth: usize,
        linear_index: usize,
        child_index: usize,
        line_position: DropLinePosition,
    ) -> DraggingPosition {
        DraggingPosition::BetweenItems {
            tree_id: "t".into(),
            parent_item: parent.into(),
            depth,
            linear_index,
            child_index,
            line_position,
        }
    }

    #[test]
    fn lists_each_gap_once_in_visual_order() {
        let (items, tree) = fixture();
        let positions =
            programmatic_positions(&tree, &items, &DndPolicy::default(), &[ItemId::from("C")]);

        assert_eq!(
            positions,
            vec![
                between("root", 0, 0, 0, DropLinePosition::Top),
                DraggingPosition::Item {
                    tree_id: "t".into(),
                    parent_item: "root".into(),
                    target_item: "A".into(),
                    depth: 0,
                    linear_index: 0,
                },
                // Bottom of open folder A is redirected to the top of B.
                between("A", 1, 1, 0, DropLinePosition::Top),
                between("A", 1, 2, 1, DropLinePosition::Bottom),
                DraggingPosition::Root {
                    tree_id: "t".into(),
                    target_item: "root".into(),
                    linear_index: 3,
                    child_index: 2,
                },
            ]
        );
    }

    #[test]
    fn empty_tree_offers_root() {
        let items = TreeItems::new("root", Vec::<TreeItem>::new());
        let tree = LinearTree::build("t", "root", &items, |_| true);
        let positions =
            programmatic_positions(&tree, &items, &DndPolicy::default(), &[ItemId::from("X")]);
        assert_eq!(
            positions,
            vec![DraggingPosition::Root {
                tree_id: "t".into(),
                target_item: "root".into(),
                linear_index: 0,
                child_index: 0,
            }]
        );
    }

    #[test]
    fn closest_position_picks_nearest_row() {
        let (items, tree) = fixture();
        let positions =
            programmatic_positions(&tree, &items, &DndPolicy::default(), &[ItemId::from("C")]);
        assert_eq!(closest_position(&positions, 0), Some(0));
        assert_eq!(closest_position(&positions, 2), Some(3));
        assert_eq!(closest_position(&[], 2), None);
    }
}

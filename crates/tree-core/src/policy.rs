use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, TreeDataProvider};
use crate::position::DraggingPosition;

/// Caller-supplied veto consulted after the capability flags.
pub type CanDropAt = Rc<dyn Fn(&[ItemId], &DraggingPosition) -> bool>;

/// Drag-and-drop capabilities of a tree environment.
///
/// Passed by reference into every resolution; treat it as immutable for the duration of one
/// pointer event.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DndPolicy {
    pub can_drag_and_drop: bool,
    pub can_drop_on_folder: bool,
    pub can_drop_on_non_folder: bool,
    pub can_reorder_items: bool,
    pub can_drop_below_open_folders: bool,
    #[serde(skip)]
    drop_predicate: Option<CanDropAt>,
}

impl Default for DndPolicy {
    fn default() -> Self {
        Self {
            can_drag_and_drop: true,
            can_drop_on_folder: true,
            can_drop_on_non_folder: false,
            can_reorder_items: true,
            can_drop_below_open_folders: false,
            drop_predicate: None,
        }
    }
}

impl fmt::Debug for DndPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DndPolicy")
            .field("can_drag_and_drop", &self.can_drag_and_drop)
            .field("can_drop_on_folder", &self.can_drop_on_folder)
            .field("can_drop_on_non_folder", &self.can_drop_on_non_folder)
            .field("can_reorder_items", &self.can_reorder_items)
            .field(
                "can_drop_below_open_folders",
                &self.can_drop_below_open_folders,
            )
            .field("drop_predicate", &self.drop_predicate.is_some())
            .finish()
    }
}

impl DndPolicy {
    pub fn can_drag_and_drop(mut self, value: bool) -> Self {
        self.can_drag_and_drop = value;
        self
    }

    pub fn can_drop_on_folder(mut self, value: bool) -> Self {
        self.can_drop_on_folder = value;
        self
    }

    pub fn can_drop_on_non_folder(mut self, value: bool) -> Self {
        self.can_drop_on_non_folder = value;
        self
    }

    pub fn can_reorder_items(mut self, value: bool) -> Self {
        self.can_reorder_items = value;
        self
    }

    pub fn can_drop_below_open_folders(mut self, value: bool) -> Self {
        self.can_drop_below_open_folders = value;
        self
    }

    /// Install a custom veto. It only runs for positions the flags already allow.
    pub fn drop_predicate(
        mut self,
        predicate: impl Fn(&[ItemId], &DraggingPosition) -> bool + 'static,
    ) -> Self {
        self.drop_predicate = Some(Rc::new(predicate));
        self
    }

    pub fn clear_drop_predicate(mut self) -> Self {
        self.drop_predicate = None;
        self
    }

    pub fn has_drop_predicate(&self) -> bool {
        self.drop_predicate.is_some()
    }

    /// Whether a row of the given folder-ness accepts a drop directly onto it.
    #[inline]
    pub fn allows_drop_on(&self, is_folder: bool) -> bool {
        if is_folder {
            self.can_drop_on_folder
        } else {
            self.can_drop_on_non_folder
        }
    }

    /// Validate a classified position against the flags, then the custom predicate.
    pub fn can_drop_at<S>(
        &self,
        items: &S,
        dragging_items: &[ItemId],
        position: &DraggingPosition,
    ) -> bool
    where
        S: TreeDataProvider + ?Sized,
    {
        let allowed_by_flags = match position {
            DraggingPosition::BetweenItems { .. } => self.can_reorder_items,
            DraggingPosition::Root { .. } => self.can_drop_on_folder,
            DraggingPosition::Item { target_item, .. } => match items.item(target_item) {
                Some(item) => self.allows_drop_on(item.is_folder),
                None => {
                    log::warn!("drop target {target_item} is missing from the item store");
                    false
                }
            },
        };
        if !allowed_by_flags {
            return false;
        }

        match &self.drop_predicate {
            Some(predicate) => !dragging_items.is_empty() && predicate(dragging_items, position),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::item::{TreeItem, TreeItems};
    use crate::position::DropLinePosition;

    fn items() -> TreeItems {
        TreeItems::new(
            "root",
            [
                TreeItem::new("root", "root").children(["A", "C"]),
                TreeItem::new("A", "A").children(["B"]),
                TreeItem::new("B", "B"),
                TreeItem::new("C", "C"),
            ],
        )
    }

    fn on_item(target: &str) -> DraggingPosition {
        DraggingPosition::Item {
            tree_id: "t".into(),
            parent_item: "root".into(),
            target_item: target.into(),
            depth: 0,
            linear_index: 0,
        }
    }

    fn between() -> DraggingPosition {
        DraggingPosition::BetweenItems {
            tree_id: "t".into(),
            parent_item: "root".into(),
            depth: 0,
            linear_index: 1,
            child_index: 1,
            line_position: DropLinePosition::Bottom,
        }
    }

    fn root() -> DraggingPosition {
        DraggingPosition::Root {
            tree_id: "t".into(),
            target_item: "root".into(),
            linear_index: 3,
            child_index: 2,
        }
    }

    #[test]
    fn flags_gate_each_variant() {
        let items = items();
        let dragging = [ItemId::from("B")];

        let policy = DndPolicy::default().can_reorder_items(false);
        assert!(!policy.can_drop_at(&items, &dragging, &between()));
        assert!(policy.can_drop_at(&items, &dragging, &on_item("A")));

        let policy = DndPolicy::default().can_drop_on_folder(false);
        assert!(!policy.can_drop_at(&items, &dragging, &root()));
        assert!(!policy.can_drop_at(&items, &dragging, &on_item("A")));
        assert!(policy.can_drop_at(&items, &dragging, &between()));

        let policy = DndPolicy::default();
        assert!(!policy.can_drop_at(&items, &dragging, &on_item("C")));
        let policy = policy.can_drop_on_non_folder(true);
        assert!(policy.can_drop_at(&items, &dragging, &on_item("C")));
    }

    #[test]
    fn missing_target_item_is_rejected() {
        let policy = DndPolicy::default().can_drop_on_non_folder(true);
        assert!(!policy.can_drop_at(&items(), &[ItemId::from("B")], &on_item("missing")));
    }

    #[test]
    fn predicate_runs_only_after_flags_pass() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let policy = DndPolicy::default()
            .can_reorder_items(false)
            .drop_predicate(move |_, _| {
                counter.set(counter.get() + 1);
                true
            });

        assert!(!policy.can_drop_at(&items(), &[ItemId::from("B")], &between()));
        assert_eq!(calls.get(), 0);

        assert!(policy.can_drop_at(&items(), &[ItemId::from("B")], &on_item("A")));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn flipping_predicate_flips_legality() {
        let items = items();
        let dragging = [ItemId::from("B")];
        let allow = DndPolicy::default().drop_predicate(|_, _| true);
        let deny = DndPolicy::default().drop_predicate(|_, _| false);
        for position in [between(), root(), on_item("A")] {
            assert!(allow.can_drop_at(&items, &dragging, &position));
            assert!(!deny.can_drop_at(&items, &dragging, &position));
        }
    }

    #[test]
    fn policy_config_round_trips_through_json() {
        let policy: DndPolicy =
            serde_json::from_str(r#"{ "can_reorder_items": false, "can_drop_on_non_folder": true }"#)
                .unwrap();
        assert!(!policy.can_reorder_items);
        assert!(policy.can_drop_on_non_folder);
        assert!(policy.can_drag_and_drop);
        assert!(!policy.has_drop_predicate());

        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["can_reorder_items"], serde_json::Value::Bool(false));
        assert!(json.get("drop_predicate").is_none());
    }
}

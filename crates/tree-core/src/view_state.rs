use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::item::ItemId;
use crate::linear::LinearTree;

/// Expansion, selection and focus of one tree view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeViewState {
    pub expanded_items: HashSet<ItemId>,
    /// In selection order.
    pub selected_items: Vec<ItemId>,
    pub focused_item: Option<ItemId>,
}

impl TreeViewState {
    pub fn expanded<I, K>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ItemId>,
    {
        self.expanded_items = items.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    pub fn is_expanded(&self, id: &ItemId) -> bool {
        self.expanded_items.contains(id)
    }

    #[inline]
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selected_items.contains(id)
    }

    #[inline]
    pub fn is_focused(&self, id: &ItemId) -> bool {
        self.focused_item.as_ref() == Some(id)
    }

    pub fn set_expanded(&mut self, id: &ItemId, expanded: bool) {
        if expanded {
            self.expanded_items.insert(id.clone());
        } else {
            self.expanded_items.remove(id);
        }
    }

    /// Returns the new expansion state.
    pub fn toggle_expanded(&mut self, id: &ItemId) -> bool {
        let expanded = !self.is_expanded(id);
        self.set_expanded(id, expanded);
        expanded
    }

    pub fn focused_index(&self, tree: &LinearTree) -> Option<usize> {
        self.focused_item.as_ref().and_then(|id| tree.position(id))
    }

    /// Focus the row at `linear_index`, clamped to the visible rows.
    pub fn move_focus_to_index(&mut self, tree: &LinearTree, linear_index: usize) -> Option<&ItemId> {
        let last = tree.len().checked_sub(1)?;
        let row = tree.get(linear_index.min(last))?;
        self.focused_item = Some(row.item.clone());
        self.focused_item.as_ref()
    }

    /// Select only `id` and focus it.
    pub fn select_only(&mut self, id: &ItemId) {
        self.selected_items = vec![id.clone()];
        self.focused_item = Some(id.clone());
    }

    /// Select the contiguous run of rows between the selection anchor and `linear_index`.
    ///
    /// The anchor is the first selected row, falling back to the focused row.
    pub fn select_up_to(&mut self, tree: &LinearTree, linear_index: usize) {
        let Some(last) = tree.len().checked_sub(1) else {
            return;
        };
        let linear_index = linear_index.min(last);
        let anchor = self
            .selected_items
            .first()
            .and_then(|id| tree.position(id))
            .or_else(|| self.focused_index(tree))
            .unwrap_or(linear_index);

        let (start, end) = if anchor <= linear_index {
            (anchor, linear_index)
        } else {
            (linear_index, anchor)
        };
        let mut selected: Vec<ItemId> = tree.rows()[start..=end]
            .iter()
            .map(|row| row.item.clone())
            .collect();
        if anchor > linear_index {
            selected.reverse();
        }
        self.selected_items = selected;
        self.focused_item = Some(tree.rows()[linear_index].item.clone());
    }

    pub fn toggle_selected(&mut self, id: &ItemId) {
        if let Some(ix) = self.selected_items.iter().position(|selected| selected == id) {
            self.selected_items.remove(ix);
        } else {
            self.selected_items.push(id.clone());
        }
    }

    pub fn select_all(&mut self, tree: &LinearTree) {
        self.selected_items = tree.rows().iter().map(|row| row.item.clone()).collect();
    }

    /// Items a drag starting on `id` carries: the whole selection when `id` is part of it.
    pub fn dragging_items_for(&self, id: &ItemId) -> Vec<ItemId> {
        if self.is_selected(id) {
            self.selected_items.clone()
        } else {
            vec![id.clone()]
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::item::{TreeItem, TreeItems};

    fn tree() -> LinearTree {
        let items = TreeItems::new(
            "root",
            [
                TreeItem::new("root", "root").children(["A", "C", "D"]),
                TreeItem::new("A", "A").children(["B"]),
                TreeItem::new("B", "B"),
                TreeItem::new("C", "C"),
                TreeItem::new("D", "D"),
            ],
        );
        LinearTree::build("t", "root", &items, |_| true)
    }

    fn ids(items: &[ItemId]) -> Vec<&str> {
        items.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn toggle_expanded_flips_state() {
        let mut state = TreeViewState::default().expanded(["A"]);
        let a = ItemId::from("A");
        assert!(state.is_expanded(&a));
        assert!(!state.toggle_expanded(&a));
        assert!(!state.is_expanded(&a));
        assert!(state.toggle_expanded(&a));
    }

    #[test]
    fn focus_is_clamped_to_rows() {
        let tree = tree();
        let mut state = TreeViewState::default();
        assert_eq!(state.move_focus_to_index(&tree, 99).map(|id| id.as_str()), Some("D"));
        assert_eq!(state.focused_index(&tree), Some(3));
    }

    #[test]
    fn select_up_to_extends_from_first_selected() {
        let tree = tree();
        let mut state = TreeViewState::default();
        state.select_only(&ItemId::from("B"));
        state.select_up_to(&tree, 3);
        assert_eq!(ids(&state.selected_items), vec!["B", "C", "D"]);
        assert!(state.is_focused(&ItemId::from("D")));

        state.select_up_to(&tree, 0);
        assert_eq!(ids(&state.selected_items), vec!["B", "A"]);
    }

    #[test]
    fn toggle_and_select_all() {
        let tree = tree();
        let mut state = TreeViewState::default();
        state.toggle_selected(&ItemId::from("C"));
        state.toggle_selected(&ItemId::from("A"));
        assert_eq!(ids(&state.selected_items), vec!["C", "A"]);
        state.toggle_selected(&ItemId::from("C"));
        assert_eq!(ids(&state.selected_items), vec!["A"]);

        state.select_all(&tree);
        assert_eq!(ids(&state.selected_items), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn dragging_items_follow_selection() {
        let mut state = TreeViewState::default();
        state.toggle_selected(&ItemId::from("A"));
        state.toggle_selected(&ItemId::from("C"));
        assert_eq!(ids(&state.dragging_items_for(&ItemId::from("C"))), vec!["A", "C"]);
        assert_eq!(ids(&state.dragging_items_for(&ItemId::from("D"))), vec!["D"]);
    }
}

use crate::geometry::{ContainerGeometry, PointerPosition};
use crate::hover::{HoverPosition, resolve_hover};
use crate::item::{ItemId, TreeDataProvider, TreeId};
use crate::linear::LinearTree;
use crate::policy::DndPolicy;
use crate::position::{DraggingPosition, DropContext};

/// Fingerprint surfaced while the pointer is outside the tree container.
pub const OUTSIDE_CODE: &str = "outside";

/// Fingerprint of a hovered row and edge, used to suppress repeated pointer moves.
pub fn drag_code(tree_id: &TreeId, hover: &HoverPosition) -> String {
    format!(
        "{tree_id}:{}:{}{}",
        hover.linear_index,
        hover.offset.map_or("item", |offset| offset.as_str()),
        if hover.very_bottom { ":vb" } else { "" }
    )
}

fn empty_code(tree_id: &TreeId) -> String {
    format!("{tree_id}:empty")
}

/// Result of feeding one pointer event into a [`DragSession`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragOverOutcome {
    /// The event carried no usable input; nothing was evaluated and the previous target stands.
    Ignored,
    /// Same fingerprint as the previous event; nothing to surface.
    Unchanged,
    /// The fingerprint changed. `None` means there is no legal target right now.
    Changed(Option<DraggingPosition>),
}

impl DragOverOutcome {
    #[inline]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// State of one active drag gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragSession {
    dragging_items: Vec<ItemId>,
    last_code: Option<String>,
    dragging_position: Option<DraggingPosition>,
}

impl DragSession {
    pub fn new(dragging_items: Vec<ItemId>) -> Self {
        Self {
            dragging_items,
            last_code: None,
            dragging_position: None,
        }
    }

    #[inline]
    pub fn dragging_items(&self) -> &[ItemId] {
        &self.dragging_items
    }

    /// The last legal target surfaced, if any.
    #[inline]
    pub fn dragging_position(&self) -> Option<&DraggingPosition> {
        self.dragging_position.as_ref()
    }

    #[inline]
    pub fn last_code(&self) -> Option<&str> {
        self.last_code.as_deref()
    }

    /// Forget the surfaced target so the next event is always reported.
    pub fn reset(&mut self) {
        self.last_code = None;
        self.dragging_position = None;
    }

    /// Surface `position` under `code` unless `code` was the last one surfaced.
    pub fn show(&mut self, code: String, position: Option<DraggingPosition>) -> DragOverOutcome {
        if self.last_code.as_deref() == Some(code.as_str()) {
            log::trace!("drag position unchanged ({code})");
            return DragOverOutcome::Unchanged;
        }

        match &position {
            Some(position) => log::debug!("drag position {code}: {position:?}"),
            None => log::debug!("drag position {code}: no target"),
        }
        self.last_code = Some(code);
        self.dragging_position = position.clone();
        DragOverOutcome::Changed(position)
    }

    /// Resolve one pointer move over `tree`.
    pub fn drag_over<S>(
        &mut self,
        pointer: PointerPosition,
        geometry: &ContainerGeometry,
        tree: &LinearTree,
        items: &S,
        policy: &DndPolicy,
    ) -> DragOverOutcome
    where
        S: TreeDataProvider + ?Sized,
    {
        if !pointer.is_valid()
            || self.dragging_items.is_empty()
            || !policy.can_drag_and_drop
            || geometry.row_height <= 0.0
            || !geometry.row_height.is_finite()
        {
            return DragOverOutcome::Ignored;
        }

        let (code, hover) = if tree.is_empty() {
            (empty_code(tree.tree_id()), Some(HoverPosition::row(0, None)))
        } else if !geometry.bounds.contains(pointer) {
            (OUTSIDE_CODE.to_string(), None)
        } else {
            let hover = resolve_hover(
                pointer.y,
                geometry.content_top(),
                geometry.row_height,
                tree,
                items,
                policy,
            );
            (drag_code(tree.tree_id(), &hover), Some(hover))
        };

        if self.last_code.as_deref() == Some(code.as_str()) {
            log::trace!("drag position unchanged ({code})");
            return DragOverOutcome::Unchanged;
        }

        let position = hover.and_then(|hover| {
            DropContext::new(tree, items, policy, &self.dragging_items).resolve(hover)
        });
        self.show(code, position)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::geometry::Bounds;
    use crate::item::{TreeItem, TreeItems};
    use crate::position::DropLinePosition;

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

    fn geometry() -> ContainerGeometry {
        ContainerGeometry::new(Bounds::new(0.0, 0.0, 200.0, 100.0), 20.0)
    }

    #[test]
    fn drag_code_distinguishes_very_bottom() {
        let tree_id = TreeId::from("t");
        assert_eq!(
            drag_code(&tree_id, &HoverPosition::row(2, Some(DropLinePosition::Bottom))),
            "t:2:bottom"
        );
        assert_eq!(drag_code(&tree_id, &HoverPosition::very_bottom(2)), "t:2:bottom:vb");
        assert_eq!(drag_code(&tree_id, &HoverPosition::row(0, None)), "t:0:item");
    }

    #[test]
    fn repeated_pointer_moves_are_suppressed() {
        let (items, tree) = fixture();
        let policy = DndPolicy::default();
        let mut session = DragSession::new(vec![ItemId::from("C")]);

        let first = session.drag_over(
            PointerPosition::new(10.0, 10.0),
            &geometry(),
            &tree,
            &items,
            &policy,
        );
        assert!(first.is_changed());
        for y in [9.0, 11.0, 12.5] {
            let outcome = session.drag_over(
                PointerPosition::new(10.0, y),
                &geometry(),
                &tree,
                &items,
                &policy,
            );
            assert_eq!(outcome, DragOverOutcome::Unchanged);
        }
        assert_eq!(session.last_code(), Some("t:0:item"));
    }

    #[test]
    fn invalid_pointer_keeps_previous_target() {
        let (items, tree) = fixture();
        let policy = DndPolicy::default();
        let mut session = DragSession::new(vec![ItemId::from("C")]);

        session.drag_over(
            PointerPosition::new(10.0, 10.0),
            &geometry(),
            &tree,
            &items,
            &policy,
        );
        let before = session.clone();
        let outcome = session.drag_over(
            PointerPosition::new(-3.0, 10.0),
            &geometry(),
            &tree,
            &items,
            &policy,
        );
        assert_eq!(outcome, DragOverOutcome::Ignored);
        assert_eq!(session, before);
    }

    #[test]
    fn leaving_the_container_surfaces_no_target_once() {
        let (items, tree) = fixture();
        let policy = DndPolicy::default();
        let mut session = DragSession::new(vec![ItemId::from("C")]);

        session.drag_over(
            PointerPosition::new(10.0, 10.0),
            &geometry(),
            &tree,
            &items,
            &policy,
        );
        let outside = PointerPosition::new(300.0, 10.0);
        assert_eq!(
            session.drag_over(outside, &geometry(), &tree, &items, &policy),
            DragOverOutcome::Changed(None)
        );
        assert_eq!(session.dragging_position(), None);
        assert_eq!(
            session.drag_over(outside, &geometry(), &tree, &items, &policy),
            DragOverOutcome::Unchanged
        );
        assert_eq!(session.last_code(), Some(OUTSIDE_CODE));
    }

    #[test]
    fn disabled_dnd_is_ignored() {
        let (items, tree) = fixture();
        let policy = DndPolicy::default().can_drag_and_drop(false);
        let mut session = DragSession::new(vec![ItemId::from("C")]);
        let outcome = session.drag_over(
            PointerPosition::new(10.0, 10.0),
            &geometry(),
            &tree,
            &items,
            &policy,
        );
        assert_eq!(outcome, DragOverOutcome::Ignored);
        assert_eq!(session.last_code(), None);
    }

    #[test]
    fn empty_drag_set_is_ignored() {
        let (items, tree) = fixture();
        let mut session = DragSession::new(Vec::new());
        let outcome = session.drag_over(
            PointerPosition::new(10.0, 10.0),
            &geometry(),
            &tree,
            &items,
            &DndPolicy::default(),
        );
        assert_eq!(outcome, DragOverOutcome::Ignored);
    }

    #[test]
    fn reset_reports_the_same_target_again() {
        let (items, tree) = fixture();
        let policy = DndPolicy::default();
        let mut session = DragSession::new(vec![ItemId::from("C")]);
        let pointer = PointerPosition::new(10.0, 10.0);

        let first = session.drag_over(pointer, &geometry(), &tree, &items, &policy);
        session.reset();
        assert_eq!(session.dragging_position(), None);
        let second = session.drag_over(pointer, &geometry(), &tree, &items, &policy);
        assert_eq!(first, second);
        assert!(second.is_changed());
    }
}

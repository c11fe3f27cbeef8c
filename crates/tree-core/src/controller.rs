use std::fmt;
use std::rc::Rc;

use crate::geometry::{ContainerGeometry, PointerPosition};
use crate::item::{ItemId, TreeDataProvider};
use crate::linear::LinearTree;
use crate::policy::DndPolicy;
use crate::position::DraggingPosition;
use crate::programmatic::{closest_position, programmatic_positions};
use crate::session::{DragOverOutcome, DragSession};

/// Fired whenever the surfaced drop target changes; `None` clears the indicator.
pub type OnDragAtPosition = Rc<dyn Fn(Option<&DraggingPosition>)>;
/// Fired once when a gesture ends on a legal target.
pub type OnPerformDrag = Rc<dyn Fn(&[ItemId], &DraggingPosition)>;

struct ProgrammaticDrag {
    positions: Vec<DraggingPosition>,
    index: usize,
}

/// Owns the policy, the callbacks and at most one drag gesture of a tree.
#[derive(Default)]
pub struct TreeDndController {
    policy: DndPolicy,
    on_drag_at_position: Option<OnDragAtPosition>,
    on_perform_drag: Option<OnPerformDrag>,
    session: Option<DragSession>,
    programmatic: Option<ProgrammaticDrag>,
}

impl fmt::Debug for TreeDndController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeDndController")
            .field("policy", &self.policy)
            .field("session", &self.session)
            .field("programmatic", &self.programmatic.is_some())
            .finish()
    }
}

impl TreeDndController {
    pub fn new(policy: DndPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn on_drag_at_position(
        mut self,
        f: impl Fn(Option<&DraggingPosition>) + 'static,
    ) -> Self {
        self.on_drag_at_position = Some(Rc::new(f));
        self
    }

    pub fn on_perform_drag(mut self, f: impl Fn(&[ItemId], &DraggingPosition) + 'static) -> Self {
        self.on_perform_drag = Some(Rc::new(f));
        self
    }

    #[inline]
    pub fn policy(&self) -> &DndPolicy {
        &self.policy
    }

    /// Replace the policy. The active gesture, if any, re-reports its next target.
    pub fn set_policy(&mut self, policy: DndPolicy) {
        self.policy = policy;
        if let Some(session) = self.session.as_mut() {
            session.reset();
        }
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    #[inline]
    pub fn is_programmatic_dragging(&self) -> bool {
        self.programmatic.is_some()
    }

    pub fn dragging_items(&self) -> &[ItemId] {
        self.session
            .as_ref()
            .map(|session| session.dragging_items())
            .unwrap_or(&[])
    }

    pub fn dragging_position(&self) -> Option<&DraggingPosition> {
        self.session
            .as_ref()
            .and_then(|session| session.dragging_position())
    }

    fn notify(&self, position: Option<&DraggingPosition>) {
        if let Some(on_drag_at_position) = &self.on_drag_at_position {
            on_drag_at_position(position);
        }
    }

    /// Begin a gesture for `dragging_items`.
    ///
    /// Refused while another gesture is active, when drag and drop is disabled, or when any of
    /// the items is unknown or not movable.
    pub fn start_drag<S>(&mut self, dragging_items: Vec<ItemId>, items: &S) -> bool
    where
        S: TreeDataProvider + ?Sized,
    {
        if self.session.is_some() {
            log::warn!("a drag is already in progress, ignoring new drag");
            return false;
        }
        if !self.policy.can_drag_and_drop || dragging_items.is_empty() {
            return false;
        }
        if let Some(id) = dragging_items
            .iter()
            .find(|id| !items.item(id).is_some_and(|item| item.can_move))
        {
            log::debug!("{id} cannot be moved, drag refused");
            return false;
        }

        log::debug!("drag started with {} item(s)", dragging_items.len());
        self.session = Some(DragSession::new(dragging_items));
        true
    }

    /// Feed a pointer move into the active gesture.
    pub fn drag_over<S>(
        &mut self,
        pointer: PointerPosition,
        geometry: &ContainerGeometry,
        tree: &LinearTree,
        items: &S,
    ) -> DragOverOutcome
    where
        S: TreeDataProvider + ?Sized,
    {
        if self.programmatic.is_some() {
            return DragOverOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return DragOverOutcome::Ignored;
        };

        let outcome = session.drag_over(pointer, geometry, tree, items, &self.policy);
        if let DragOverOutcome::Changed(position) = &outcome {
            self.notify(position.as_ref());
        }
        outcome
    }

    /// End the gesture. Returns the dropped items and their target when the last surfaced
    /// target was legal, after firing `on_perform_drag`.
    pub fn drop(&mut self) -> Option<(Vec<ItemId>, DraggingPosition)> {
        self.programmatic = None;
        let session = self.session.take()?;
        let Some(position) = session.dragging_position().cloned() else {
            log::debug!("drag ended without a target");
            return None;
        };

        log::debug!("drop on {position:?}");
        let dragging_items = session.dragging_items().to_vec();
        if let Some(on_perform_drag) = &self.on_perform_drag {
            on_perform_drag(&dragging_items, &position);
        }
        self.notify(None);
        Some((dragging_items, position))
    }

    /// End the gesture without dropping.
    pub fn abort(&mut self) {
        self.programmatic = None;
        if let Some(session) = self.session.take() {
            log::debug!("drag aborted");
            if session.dragging_position().is_some() {
                self.notify(None);
            }
        }
    }

    fn show_programmatic(&mut self) {
        let Some(programmatic) = &self.programmatic else {
            return;
        };
        let Some(position) = programmatic.positions.get(programmatic.index).cloned() else {
            return;
        };
        let code = format!("{}:programmatic:{}", position.tree_id(), programmatic.index);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let DragOverOutcome::Changed(position) = session.show(code, Some(position)) {
            self.notify(position.as_ref());
        }
    }

    /// Begin a keyboard driven gesture, starting at the target nearest the first dragged item.
    pub fn start_programmatic_drag<S>(
        &mut self,
        dragging_items: Vec<ItemId>,
        tree: &LinearTree,
        items: &S,
    ) -> bool
    where
        S: TreeDataProvider + ?Sized,
    {
        let anchor = dragging_items
            .first()
            .and_then(|id| tree.position(id))
            .unwrap_or(0);
        if !self.start_drag(dragging_items, items) {
            return false;
        }

        let positions =
            programmatic_positions(tree, items, &self.policy, self.dragging_items());
        let Some(index) = closest_position(&positions, anchor) else {
            log::debug!("no legal target for a keyboard drag");
            self.session = None;
            return false;
        };

        self.programmatic = Some(ProgrammaticDrag { positions, index });
        self.show_programmatic();
        true
    }

    pub fn programmatic_drag_up(&mut self) {
        if let Some(programmatic) = self.programmatic.as_mut() {
            programmatic.index = programmatic.index.saturating_sub(1);
        }
        self.show_programmatic();
    }

    pub fn programmatic_drag_down(&mut self) {
        if let Some(programmatic) = self.programmatic.as_mut() {
            programmatic.index = (programmatic.index + 1).min(programmatic.positions.len() - 1);
        }
        self.show_programmatic();
    }

    pub fn complete_programmatic_drag(&mut self) -> Option<(Vec<ItemId>, DraggingPosition)> {
        if self.programmatic.is_none() {
            return None;
        }
        self.drop()
    }

    pub fn abort_programmatic_drag(&mut self) {
        if self.programmatic.is_some() {
            self.abort();
        }
    }
}

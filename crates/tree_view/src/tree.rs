use std::{ops::Range, rc::Rc};

use gpui::{
    App, AppContext as _, Context, ElementId, Entity, EntityId, FocusHandle,
    InteractiveElement as _, IntoElement, ListSizingBehavior, ParentElement as _, Pixels, Render,
    RenderOnce, ScrollStrategy, SharedString, StatefulInteractiveElement as _, StyleRefinement,
    Styled, UniformListScrollHandle, Window, div, prelude::FluentBuilder as _, px, uniform_list,
};
use gpui_component::list::ListItem;
use gpui_component::scroll::{Scrollbar, ScrollbarState};
use gpui_component::{ActiveTheme as _, StyledExt as _};
use gpui_tree_core::{
    Bounds, ContainerGeometry, DndPolicy, DragOverOutcome, DraggingPosition, DropLinePosition,
    ItemId, LinearTree, PointerPosition, TreeDataProvider, TreeDndController, TreeId, TreeItem,
    TreeItems, TreeViewState,
};

const CONTEXT: &str = "TreeView";
const DEFAULT_ROW_HEIGHT: Pixels = px(28.);

/// Create a [`TreeView`].
pub fn tree_view<R>(state: &Entity<TreeState>, render_item: R) -> TreeView
where
    R: Fn(usize, &TreeEntry, TreeRowState, &mut Window, &mut App) -> ListItem + 'static,
{
    TreeView::new(state, render_item)
}

#[derive(Clone)]
struct TreeDrag {
    tree_id: EntityId,
    item_ids: Vec<ItemId>,
    label: SharedString,
}

struct DragGhost {
    label: SharedString,
}

impl DragGhost {
    fn new(label: SharedString) -> Self {
        Self { label }
    }
}

impl Render for DragGhost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        div()
            .px(px(10.))
            .py(px(6.))
            .rounded(px(8.))
            .bg(theme.popover)
            .border_1()
            .border_color(theme.border)
            .shadow_md()
            .text_color(theme.popover_foreground)
            .text_sm()
            .child(self.label.clone())
    }
}

/// A visible row: the item, its depth and whether it is expanded.
#[derive(Clone, Debug)]
pub struct TreeEntry {
    item: TreeItem,
    depth: usize,
    expanded: bool,
}

impl TreeEntry {
    #[inline]
    pub fn item(&self) -> &TreeItem {
        &self.item
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_folder(&self) -> bool {
        self.item.is_folder
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeDropTarget {
    Before,
    After,
    Inside,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TreeRowState {
    pub selected: bool,
    pub focused: bool,
    pub dragging: bool,
    pub drop_target: Option<TreeDropTarget>,
}

#[derive(Clone, Debug, PartialEq)]
struct DropPreview {
    position: DraggingPosition,
    line_y: Option<Pixels>,
    line_x: Option<Pixels>,
}

impl DropPreview {
    fn row_target(&self, ix: usize) -> Option<TreeDropTarget> {
        match &self.position {
            DraggingPosition::Item { linear_index, .. } if *linear_index == ix => {
                Some(TreeDropTarget::Inside)
            }
            DraggingPosition::BetweenItems {
                linear_index,
                line_position: DropLinePosition::Top,
                ..
            } if *linear_index == ix => Some(TreeDropTarget::Before),
            DraggingPosition::BetweenItems {
                linear_index,
                line_position: DropLinePosition::Bottom,
                ..
            } if *linear_index == ix + 1 => Some(TreeDropTarget::After),
            _ => None,
        }
    }
}

/// State of a [`TreeView`]: the item store, its view state and the drag gesture.
pub struct TreeState {
    focus_handle: FocusHandle,
    tree_id: TreeId,
    items: TreeItems,
    view: TreeViewState,
    linear: LinearTree,
    entries: Vec<TreeEntry>,
    controller: TreeDndController,
    row_height: Pixels,
    indent_width: Pixels,
    indent_offset: Pixels,
    scrollbar_state: ScrollbarState,
    scroll_handle: UniformListScrollHandle,
    drop_preview: Option<DropPreview>,
    render_item: Rc<dyn Fn(usize, &TreeEntry, TreeRowState, &mut Window, &mut App) -> ListItem>,
}

impl TreeState {
    pub fn new(cx: &mut App) -> Self {
        let tree_id = TreeId::from("tree");
        let items = TreeItems::new("root", Vec::<TreeItem>::new());
        let linear = LinearTree::from_rows(tree_id.clone(), items.root_item(), Vec::new());
        Self {
            focus_handle: cx.focus_handle(),
            tree_id,
            items,
            view: TreeViewState::default(),
            linear,
            entries: Vec::new(),
            controller: TreeDndController::default(),
            row_height: DEFAULT_ROW_HEIGHT,
            indent_width: px(16.),
            indent_offset: px(0.),
            scrollbar_state: ScrollbarState::default(),
            scroll_handle: UniformListScrollHandle::default(),
            drop_preview: None,
            render_item: Rc::new(|_, _, _, _, _| ListItem::new("tree-view-empty")),
        }
    }

    pub fn tree_id(mut self, tree_id: impl Into<TreeId>) -> Self {
        self.tree_id = tree_id.into();
        self.rebuild_entries();
        self
    }

    /// Set the height of every row. Drop targets are resolved against it.
    pub fn row_height(mut self, row_height: Pixels) -> Self {
        self.row_height = row_height;
        self
    }

    /// Set the indentation width (in pixels) of one nesting level.
    ///
    /// This should match the indentation used by your row renderer.
    pub fn indent_width(mut self, indent_width: Pixels) -> Self {
        self.indent_width = indent_width;
        self
    }

    /// Set the left offset for the drop indicator line.
    pub fn indent_offset(mut self, indent_offset: Pixels) -> Self {
        self.indent_offset = indent_offset;
        self
    }

    pub fn policy(mut self, policy: DndPolicy) -> Self {
        self.controller.set_policy(policy);
        self
    }

    /// Observe every change of the surfaced drop target.
    pub fn on_drag_at_position(
        mut self,
        f: impl Fn(Option<&DraggingPosition>) + 'static,
    ) -> Self {
        self.controller = std::mem::take(&mut self.controller).on_drag_at_position(f);
        self
    }

    /// Observe completed drops. The move is applied to the items right after.
    pub fn on_perform_drag(mut self, f: impl Fn(&[ItemId], &DraggingPosition) + 'static) -> Self {
        self.controller = std::mem::take(&mut self.controller).on_perform_drag(f);
        self
    }

    pub fn items(mut self, items: TreeItems) -> Self {
        self.items = items;
        self.rebuild_entries();
        self
    }

    pub fn expanded<I, K>(mut self, expanded: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ItemId>,
    {
        self.view = std::mem::take(&mut self.view).expanded(expanded);
        self.rebuild_entries();
        self
    }

    pub fn set_items(&mut self, items: TreeItems, cx: &mut Context<Self>) {
        self.items = items;
        self.view.selected_items.clear();
        self.view.focused_item = None;
        self.controller.abort();
        self.drop_preview = None;
        self.rebuild_entries();
        cx.notify();
    }

    pub fn set_policy(&mut self, policy: DndPolicy, cx: &mut Context<Self>) {
        self.controller.set_policy(policy);
        cx.notify();
    }

    #[inline]
    pub fn tree_items(&self) -> &TreeItems {
        &self.items
    }

    #[inline]
    pub fn view_state(&self) -> &TreeViewState {
        &self.view
    }

    #[inline]
    pub fn linear_tree(&self) -> &LinearTree {
        &self.linear
    }

    #[inline]
    pub fn dnd_policy(&self) -> &DndPolicy {
        self.controller.policy()
    }

    pub fn dragging_position(&self) -> Option<&DraggingPosition> {
        self.controller.dragging_position()
    }

    pub fn focused_entry(&self) -> Option<&TreeEntry> {
        self.view
            .focused_index(&self.linear)
            .and_then(|ix| self.entries.get(ix))
    }

    fn rebuild_entries(&mut self) {
        let linear = LinearTree::build(
            self.tree_id.clone(),
            self.items.root_item(),
            &self.items,
            |id| self.view.is_expanded(id),
        );
        self.entries = linear
            .rows()
            .iter()
            .map(|row| TreeEntry {
                item: self
                    .items
                    .item(&row.item)
                    .cloned()
                    .unwrap_or_else(|| TreeItem::new(&row.item, row.item.to_string())),
                depth: row.depth,
                expanded: self.view.is_expanded(&row.item),
            })
            .collect();
        self.linear = linear;
    }

    fn scroll_y(&self) -> Pixels {
        self.scroll_handle.0.borrow().base_handle.offset().y
    }

    fn focus_row(&mut self, ix: usize, cx: &mut Context<Self>) {
        if let Some(ix) = self
            .view
            .move_focus_to_index(&self.linear, ix)
            .and_then(|id| self.linear.position(id))
        {
            self.scroll_handle.scroll_to_item(ix, ScrollStrategy::Center);
        }
        cx.notify();
    }

    fn toggle_expand(&mut self, ix: usize) {
        let Some(entry) = self.entries.get(ix) else {
            return;
        };
        if !entry.is_folder() {
            return;
        }
        let id = entry.item().id.clone();
        self.view.toggle_expanded(&id);
        self.rebuild_entries();
    }

    fn preview_for(&self, position: Option<&DraggingPosition>) -> Option<DropPreview> {
        let position = position?.clone();
        let scroll_y = self.scroll_y();
        let (line_y, line_x) = match &position {
            DraggingPosition::Item { .. } => (None, None),
            DraggingPosition::BetweenItems {
                linear_index,
                depth,
                ..
            } => (
                Some(self.row_height * *linear_index + scroll_y),
                Some(self.indent_offset + self.indent_width * *depth),
            ),
            DraggingPosition::Root { linear_index, .. } => (
                Some(self.row_height * *linear_index + scroll_y),
                Some(self.indent_offset),
            ),
        };
        Some(DropPreview {
            position,
            line_y,
            line_x,
        })
    }

    fn set_drop_preview(&mut self, position: Option<&DraggingPosition>, cx: &mut Context<Self>) {
        let new_preview = self.preview_for(position);
        if self.drop_preview != new_preview {
            self.drop_preview = new_preview;
            cx.notify();
        }
    }

    fn on_entry_click(
        &mut self,
        ix: usize,
        _event: &gpui::ClickEvent,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        window.focus(&self.focus_handle);
        let Some(id) = self.entries.get(ix).map(|entry| entry.item().id.clone()) else {
            return;
        };

        let modifiers = window.modifiers();
        if modifiers.shift {
            self.view.select_up_to(&self.linear, ix);
        } else if modifiers.secondary() {
            self.view.toggle_selected(&id);
            self.view.focused_item = Some(id);
        } else {
            self.view.select_only(&id);
            self.toggle_expand(ix);
        }
        cx.notify();
    }

    fn on_drag_start(&mut self, drag: &TreeDrag, cx: &mut Context<Self>) {
        if drag.tree_id != cx.entity_id() {
            return;
        }
        if let Some(first) = drag.item_ids.first()
            && !self.view.is_selected(first)
        {
            self.view.select_only(first);
        }
        self.drop_preview = None;
        self.controller.start_drag(drag.item_ids.clone(), &self.items);
        cx.notify();
    }

    fn on_drag_move(
        &mut self,
        event: &gpui::DragMoveEvent<TreeDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() {
            return;
        }

        let drag = event.drag(cx);
        if drag.tree_id != cx.entity_id() {
            self.set_drop_preview(None, cx);
            return;
        }

        let mouse_position = event.event.position;
        let list_bounds = event.bounds;
        let geometry = ContainerGeometry::new(
            Bounds::new(
                list_bounds.origin.x.into(),
                list_bounds.origin.y.into(),
                list_bounds.size.width.into(),
                list_bounds.size.height.into(),
            ),
            self.row_height.into(),
        )
        .scroll_offset(self.scroll_y().into());
        let pointer = PointerPosition::new(mouse_position.x.into(), mouse_position.y.into());

        if let DragOverOutcome::Changed(position) =
            self.controller
                .drag_over(pointer, &geometry, &self.linear, &self.items)
        {
            self.set_drop_preview(position.as_ref(), cx);
        }
    }

    fn apply_drop(&mut self, dropped: Option<(Vec<ItemId>, DraggingPosition)>) {
        self.drop_preview = None;
        let Some((dragging_items, position)) = dropped else {
            return;
        };

        if let Err(err) = self.items.move_items(&dragging_items, &position) {
            log::warn!("failed to apply drop: {err}");
            return;
        }
        if let Some(target) = position.target_item() {
            self.view.set_expanded(target, true);
        }
        self.rebuild_entries();
        self.view.selected_items = dragging_items;
        self.view.focused_item = self.view.selected_items.first().cloned();
    }

    fn on_drop(&mut self, drag: &TreeDrag, _window: &mut Window, cx: &mut Context<Self>) {
        if drag.tree_id != cx.entity_id() {
            self.controller.abort();
            self.drop_preview = None;
            cx.notify();
            return;
        }

        let dropped = self.controller.drop();
        self.apply_drop(dropped);
        cx.notify();
    }

    fn on_key_down(&mut self, event: &gpui::KeyDownEvent, cx: &mut Context<Self>) -> bool {
        let modifiers = event.keystroke.modifiers;
        let key = event.keystroke.key.as_str();

        if self.controller.is_programmatic_dragging() {
            match key {
                "up" => self.controller.programmatic_drag_up(),
                "down" => self.controller.programmatic_drag_down(),
                "enter" => {
                    let dropped = self.controller.complete_programmatic_drag();
                    self.apply_drop(dropped);
                    cx.notify();
                    return true;
                }
                "escape" => self.controller.abort_programmatic_drag(),
                _ => return false,
            }
            let position = self.controller.dragging_position().cloned();
            self.set_drop_preview(position.as_ref(), cx);
            cx.notify();
            return true;
        }

        if cx.has_active_drag() || self.entries.is_empty() {
            return false;
        }

        let last_ix = self.entries.len() - 1;
        let focused_ix = self.view.focused_index(&self.linear);

        match key {
            "up" | "down" => {
                let ix = match (key, focused_ix) {
                    (_, None) => 0,
                    ("up", Some(ix)) => ix.saturating_sub(1),
                    (_, Some(ix)) => (ix + 1).min(last_ix),
                };
                if modifiers.shift {
                    self.view.select_up_to(&self.linear, ix);
                }
                self.focus_row(ix, cx);
                true
            }
            "home" => {
                self.focus_row(0, cx);
                true
            }
            "end" => {
                self.focus_row(last_ix, cx);
                true
            }
            "enter" => {
                let Some(ix) = focused_ix else {
                    return false;
                };
                if !self.entries[ix].is_folder() {
                    return false;
                }
                self.toggle_expand(ix);
                cx.notify();
                true
            }
            "space" if modifiers.secondary() => {
                let Some(id) = self.view.focused_item.clone() else {
                    return false;
                };
                self.view.toggle_selected(&id);
                cx.notify();
                true
            }
            "a" if modifiers.secondary() => {
                self.view.select_all(&self.linear);
                cx.notify();
                true
            }
            "d" if modifiers.secondary() && modifiers.shift => {
                let Some(id) = self.view.focused_item.clone() else {
                    return false;
                };
                let dragging_items = self.view.dragging_items_for(&id);
                if self
                    .controller
                    .start_programmatic_drag(dragging_items, &self.linear, &self.items)
                {
                    let position = self.controller.dragging_position().cloned();
                    self.set_drop_preview(position.as_ref(), cx);
                }
                cx.notify();
                true
            }
            _ => false,
        }
    }
}

impl Render for TreeState {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if self.controller.is_dragging()
            && !self.controller.is_programmatic_dragging()
            && !cx.has_active_drag()
        {
            self.controller.abort();
            self.drop_preview = None;
        }

        let render_item = Rc::clone(&self.render_item);
        let state_entity = cx.entity();
        let drop_preview = self.drop_preview.clone();
        let row_height = self.row_height;
        let can_drag = self.controller.policy().can_drag_and_drop;

        let line = drop_preview
            .as_ref()
            .and_then(|p| p.line_y.zip(p.line_x))
            .map(|(y, x)| {
                let theme = cx.theme();
                div()
                    .absolute()
                    .left(x)
                    .right_0()
                    .top(y)
                    .h(px(2.))
                    .bg(theme.drag_border)
            });

        div()
            .id("tree-view-state")
            .size_full()
            .relative()
            .child(
                uniform_list("entries", self.entries.len(), {
                    cx.processor(move |state, visible_range: Range<usize>, window, cx| {
                        let drop_target_bg = cx.theme().drop_target;
                        let mut items = Vec::with_capacity(visible_range.len());
                        for ix in visible_range {
                            let entry = &state.entries[ix];
                            let id = &entry.item().id;
                            let selected = state.view.is_selected(id);
                            let dragging = state.controller.dragging_items().contains(id);
                            let drop_target =
                                drop_preview.as_ref().and_then(|preview| preview.row_target(ix));

                            let row_state = TreeRowState {
                                selected,
                                focused: state.view.is_focused(id),
                                dragging,
                                drop_target,
                            };

                            let item = (render_item)(ix, entry, row_state, window, cx);
                            let drag_value = TreeDrag {
                                tree_id: cx.entity_id(),
                                item_ids: state.view.dragging_items_for(id),
                                label: if state.view.is_selected(id)
                                    && state.view.selected_items.len() > 1
                                {
                                    format!("{} items", state.view.selected_items.len()).into()
                                } else {
                                    entry.item().label.clone().into()
                                },
                            };

                            let can_move = can_drag && entry.item().can_move;
                            let row = div()
                                .id(ix)
                                .h(row_height)
                                .when(drop_target == Some(TreeDropTarget::Inside), |this| {
                                    this.bg(drop_target_bg)
                                })
                                .child(item.selected(selected))
                                .on_click(cx.listener(move |this, click_event, window, cx| {
                                    this.on_entry_click(ix, click_event, window, cx);
                                }))
                                .when(can_move, |this| {
                                    let state_entity = state_entity.clone();
                                    this.on_drag(
                                        drag_value,
                                        move |drag, _cursor_offset, _window, cx| {
                                            state_entity.update(cx, |state, cx| {
                                                state.on_drag_start(drag, cx);
                                            });
                                            let label = drag.label.clone();
                                            cx.new(|_| DragGhost::new(label))
                                        },
                                    )
                                });

                            items.push(row);
                        }
                        items
                    })
                })
                .on_drag_move::<TreeDrag>(cx.listener(Self::on_drag_move))
                .on_drop::<TreeDrag>(cx.listener(Self::on_drop))
                .flex_grow()
                .size_full()
                .track_scroll(self.scroll_handle.clone())
                .with_sizing_behavior(ListSizingBehavior::Auto)
                .into_any_element(),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .right_0()
                    .bottom_0()
                    .w(px(12.))
                    .child(Scrollbar::uniform_scroll(
                        &self.scrollbar_state,
                        &self.scroll_handle,
                    )),
            )
            .when_some(line, |this, line| this.child(line))
    }
}

/// A tree view element with drag and drop reordering and reparenting.
#[derive(IntoElement)]
pub struct TreeView {
    id: ElementId,
    state: Entity<TreeState>,
    style: StyleRefinement,
    render_item: Rc<dyn Fn(usize, &TreeEntry, TreeRowState, &mut Window, &mut App) -> ListItem>,
}

impl TreeView {
    pub fn new<R>(state: &Entity<TreeState>, render_item: R) -> Self
    where
        R: Fn(usize, &TreeEntry, TreeRowState, &mut Window, &mut App) -> ListItem + 'static,
    {
        Self {
            id: ElementId::Name(format!("tree-view-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_item: Rc::new(move |ix, entry, row_state, window, cx| {
                render_item(ix, entry, row_state, window, cx)
            }),
        }
    }
}

impl Styled for TreeView {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl RenderOnce for TreeView {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        let state_entity = self.state.clone();
        self.state
            .update(cx, |state, _| state.render_item = self.render_item);

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .on_key_down(move |event, window, cx| {
                let handled = state_entity.update(cx, |state, cx| state.on_key_down(event, cx));
                if handled {
                    window.prevent_default();
                    cx.stop_propagation();
                }
            })
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_component::list::ListItem;
use gpui_component::{h_flex, v_flex};
use gpui_tree_view::core::{
    DndPolicy, DraggingPosition, ItemId, TreeDataProvider, TreeItem, TreeItems,
};
use gpui_tree_view::{TreeDropTarget, TreeEntry, TreeRowState, TreeState, tree_view};

const ROW_HEIGHT: Pixels = px(26.);
const INDENT: Pixels = px(16.);

pub struct TreeViewExample {
    tree: Entity<TreeState>,
}

impl TreeViewExample {
    pub fn view(_window: &mut Window, cx: &mut App) -> Entity<Self> {
        let policy = DndPolicy::default()
            .can_drop_on_non_folder(false)
            .drop_predicate(|dragging, position| {
                // Only Rust sources go into tests/.
                position.receiving_item().as_str() != "tests"
                    || dragging.iter().all(|id| id.as_str().ends_with(".rs"))
            });

        let tree = cx.new(|cx| {
            TreeState::new(cx)
                .tree_id("files")
                .row_height(ROW_HEIGHT)
                .indent_width(INDENT)
                .indent_offset(px(10.))
                .policy(policy)
                .on_perform_drag(|items, position| {
                    log::info!("dropped {} item(s) on {}", items.len(), describe(position));
                })
                .items(demo_items())
                .expanded(["src", "src/ui"])
        });
        cx.new(|_| Self { tree })
    }
}

impl Render for TreeViewExample {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let state = self.tree.read(cx);
        let tree_dump = format_tree(state.tree_items());
        let focused = state
            .focused_entry()
            .map(|entry| entry.item().id.to_string())
            .unwrap_or_else(|| "<none>".to_string());
        let target = state
            .dragging_position()
            .map(describe)
            .unwrap_or_else(|| "<none>".to_string());

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                v_flex()
                    .gap_y_1()
                    .child(div().text_xl().font_weight(FontWeight::BOLD).child("Tree View"))
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child("Drag rows onto folders or between rows. Keyboard: up/down to move focus, shift to extend the selection, ctrl/cmd+shift+d to start a keyboard drag, enter to drop, escape to cancel."),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(format!("Focused: {focused}  Target: {target}")),
                    ),
            )
            .child(
                h_flex()
                    .flex_1()
                    .min_h(px(0.))
                    .gap_x_3()
                    .child(
                        v_flex()
                            .w(px(420.))
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(div().text_sm().font_weight(FontWeight::MEDIUM).child("Tree"))
                            .child(
                                div()
                                    .flex_1()
                                    .min_h(px(0.))
                                    .rounded(px(12.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .bg(theme.background)
                                    .child(tree_view(&self.tree, move |ix, entry, row_state, _window, cx| {
                                        render_tree_row(ix, entry, row_state, cx)
                                    })),
                            ),
                    )
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(
                                div()
                                    .text_sm()
                                    .font_weight(FontWeight::MEDIUM)
                                    .child("Debug (tree structure)"),
                            )
                            .child(
                                div()
                                    .flex_1()
                                    .min_h(px(0.))
                                    .rounded(px(12.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .bg(theme.background)
                                    .p(px(12.))
                                    .child(render_tree_dump(tree_dump)),
                            ),
                    ),
            )
    }
}

fn render_tree_row(ix: usize, entry: &TreeEntry, row_state: TreeRowState, cx: &mut App) -> ListItem {
    let theme = cx.theme();
    let indent = INDENT * entry.depth();
    let marker = match (entry.is_folder(), entry.is_expanded()) {
        (true, true) => "▾",
        (true, false) => "▸",
        (false, _) => " ",
    };

    ListItem::new(ix)
        .h(ROW_HEIGHT)
        .pl(px(10.) + indent)
        .when(row_state.dragging, |this| this.opacity(0.4))
        .when(row_state.focused, |this| this.border_1().border_color(theme.ring))
        .when(row_state.drop_target == Some(TreeDropTarget::Inside), |this| {
            this.text_color(theme.accent_foreground)
        })
        .child(
            h_flex()
                .gap_x_2()
                .items_center()
                .child(div().w(px(12.)).text_color(theme.muted_foreground).child(marker))
                .child(entry.item().label.clone()),
        )
}

fn render_tree_dump(text: String) -> impl IntoElement {
    let lines = text
        .lines()
        .map(|line| div().text_sm().child(line.to_string()));
    v_flex().gap_y_0p5().children(lines)
}

fn describe(position: &DraggingPosition) -> String {
    match position {
        DraggingPosition::Root { child_index, .. } => format!("root #{child_index}"),
        DraggingPosition::BetweenItems {
            parent_item,
            child_index,
            ..
        } => format!("{parent_item} #{child_index}"),
        DraggingPosition::Item { target_item, .. } => format!("into {target_item}"),
    }
}

fn format_tree(items: &TreeItems) -> String {
    fn walk(items: &TreeItems, id: &ItemId, depth: usize, out: &mut String) {
        for child in items.children_of(id) {
            out.push_str(&"  ".repeat(depth));
            out.push_str(child.as_str());
            out.push('\n');
            walk(items, child, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(items, items.root_item(), 0, &mut out);
    out
}

fn demo_items() -> TreeItems {
    TreeItems::new(
        "root",
        [
            TreeItem::new("root", "root").children(["src", "tests", "Cargo.toml", "Cargo.lock", "README.md"]),
            TreeItem::new("src", "src").children(["src/ui", "src/main.rs", "src/lib.rs"]),
            TreeItem::new("src/ui", "ui").children([
                "src/ui/button.rs",
                "src/ui/icon.rs",
                "src/ui/tree_view.rs",
            ]),
            TreeItem::new("src/ui/button.rs", "button.rs"),
            TreeItem::new("src/ui/icon.rs", "icon.rs"),
            TreeItem::new("src/ui/tree_view.rs", "tree_view.rs"),
            TreeItem::new("src/main.rs", "main.rs"),
            TreeItem::new("src/lib.rs", "lib.rs"),
            TreeItem::new("tests", "tests").folder(true),
            TreeItem::new("Cargo.toml", "Cargo.toml"),
            TreeItem::new("Cargo.lock", "Cargo.lock").can_move(false),
            TreeItem::new("README.md", "README.md"),
        ],
    )
}

use serde::{Deserialize, Serialize};

use crate::hover::HoverPosition;
use crate::item::{ItemId, TreeDataProvider, TreeId};
use crate::linear::{LinearParent, LinearTree};
use crate::policy::DndPolicy;

/// Which edge of a row a drop line is drawn on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropLinePosition {
    Top,
    Bottom,
}

impl DropLinePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

/// A semantic drop target inside one tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target_type", rename_all = "snake_case")]
pub enum DraggingPosition {
    /// Insert into the synthetic tree root at `child_index`.
    Root {
        tree_id: TreeId,
        target_item: ItemId,
        linear_index: usize,
        child_index: usize,
    },
    /// Insert into `parent_item` at `child_index`, drawn as a line on an edge of a row.
    BetweenItems {
        tree_id: TreeId,
        parent_item: ItemId,
        depth: usize,
        linear_index: usize,
        child_index: usize,
        line_position: DropLinePosition,
    },
    /// Drop directly onto `target_item`.
    Item {
        tree_id: TreeId,
        parent_item: ItemId,
        target_item: ItemId,
        depth: usize,
        linear_index: usize,
    },
}

impl DraggingPosition {
    pub fn tree_id(&self) -> &TreeId {
        match self {
            Self::Root { tree_id, .. }
            | Self::BetweenItems { tree_id, .. }
            | Self::Item { tree_id, .. } => tree_id,
        }
    }

    pub fn linear_index(&self) -> usize {
        match self {
            Self::Root { linear_index, .. }
            | Self::BetweenItems { linear_index, .. }
            | Self::Item { linear_index, .. } => *linear_index,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Self::Root { .. } => 0,
            Self::BetweenItems { depth, .. } | Self::Item { depth, .. } => *depth,
        }
    }

    /// The folder that receives the dropped items.
    pub fn receiving_item(&self) -> &ItemId {
        match self {
            Self::Root { target_item, .. } | Self::Item { target_item, .. } => target_item,
            Self::BetweenItems { parent_item, .. } => parent_item,
        }
    }

    /// The row to highlight for an `Item` target.
    pub fn target_item(&self) -> Option<&ItemId> {
        match self {
            Self::Item { target_item, .. } => Some(target_item),
            _ => None,
        }
    }
}

/// Everything a resolution pass reads, borrowed for the duration of one pointer event.
pub struct DropContext<'a, S: ?Sized> {
    pub tree: &'a LinearTree,
    pub items: &'a S,
    pub policy: &'a DndPolicy,
    pub dragging_items: &'a [ItemId],
}

impl<S: ?Sized> Clone for DropContext<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for DropContext<'_, S> {}

impl<'a, S> DropContext<'a, S>
where
    S: TreeDataProvider + ?Sized,
{
    pub fn new(
        tree: &'a LinearTree,
        items: &'a S,
        policy: &'a DndPolicy,
        dragging_items: &'a [ItemId],
    ) -> Self {
        Self {
            tree,
            items,
            policy,
            dragging_items,
        }
    }

    fn append_to_root(&self) -> DraggingPosition {
        let root_item = self.tree.root_item();
        DraggingPosition::Root {
            tree_id: self.tree.tree_id().clone(),
            target_item: root_item.clone(),
            linear_index: self.tree.len(),
            child_index: self.items.children_of(root_item).len(),
        }
    }

    /// Turn a hovered row and edge into a drop target, applying the redirect rules.
    ///
    /// Does not consult the policy gate; see [`DropContext::resolve`].
    pub fn classify(&self, hover: HoverPosition) -> Option<DraggingPosition> {
        let tree = self.tree;
        let policy = self.policy;

        if tree.is_empty() {
            return Some(DraggingPosition::Root {
                tree_id: tree.tree_id().clone(),
                target_item: tree.root_item().clone(),
                linear_index: 0,
                child_index: 0,
            });
        }

        if hover.very_bottom {
            return Some(self.append_to_root());
        }

        let mut linear_index = hover.linear_index;
        let mut offset = hover.offset;
        let mut target = tree.get(linear_index)?;

        if !policy.can_reorder_items
            && !policy.can_drop_on_non_folder
            && !self.items.is_folder(&target.item)
        {
            match tree.parent_of(linear_index)? {
                LinearParent::Root { .. } => return Some(self.append_to_root()),
                LinearParent::Row {
                    linear_index: parent_ix,
                    row,
                } => {
                    linear_index = parent_ix;
                    target = row;
                }
            }
        }

        if tree.is_descendant(linear_index, self.dragging_items) {
            return None;
        }

        if !policy.can_drop_below_open_folders
            && offset == Some(DropLinePosition::Bottom)
            && let Some(next) = tree.get(linear_index + 1)
            && next.depth == target.depth + 1
        {
            linear_index += 1;
            target = next;
            offset = Some(DropLinePosition::Top);
        }

        match offset {
            None => {
                if let Some(item) = self.items.item(&target.item)
                    && !policy.allows_drop_on(item.is_folder)
                {
                    return None;
                }
            }
            Some(_) => {
                if !policy.can_reorder_items {
                    return None;
                }
            }
        }

        let parent = tree.parent_of(linear_index)?;

        if self.dragging_items.contains(&target.item)
            || tree.is_descendant(linear_index, self.dragging_items)
        {
            return None;
        }

        let depth = target.depth;
        let Some(line_position) = offset else {
            return Some(DraggingPosition::Item {
                tree_id: tree.tree_id().clone(),
                parent_item: parent.item().clone(),
                target_item: target.item.clone(),
                depth,
                linear_index,
            });
        };

        let Some(sibling_ix) = self
            .items
            .children_of(parent.item())
            .iter()
            .position(|id| *id == target.item)
        else {
            log::warn!(
                "{} is not listed among the children of {}",
                target.item,
                parent.item()
            );
            return None;
        };
        let child_index = match line_position {
            DropLinePosition::Top => sibling_ix,
            DropLinePosition::Bottom => sibling_ix + 1,
        };

        // "Top of a row" and "bottom of the previous sibling" are the same gap; keep the latter.
        let (line_position, linear_index) = if line_position == DropLinePosition::Top
            && linear_index > 0
            && tree.rows()[linear_index - 1].depth == depth
        {
            (DropLinePosition::Bottom, linear_index - 1)
        } else {
            (line_position, linear_index)
        };

        Some(DraggingPosition::BetweenItems {
            tree_id: tree.tree_id().clone(),
            parent_item: parent.item().clone(),
            depth,
            linear_index: match line_position {
                DropLinePosition::Top => linear_index,
                DropLinePosition::Bottom => linear_index + 1,
            },
            child_index,
            line_position,
        })
    }

    /// Classify `hover` and keep the result only if the policy gate accepts it.
    pub fn resolve(&self, hover: HoverPosition) -> Option<DraggingPosition> {
        let position = self.classify(hover)?;
        self.policy
            .can_drop_at(self.items, self.dragging_items, &position)
            .then_some(position)
    }
}

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::position::DraggingPosition;

/// A cheap, clonable string key used to identify items and trees.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(Arc<str>);

pub type ItemId = Key;
pub type TreeId = Key;

impl Key {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<&Key> for Key {
    fn from(value: &Key) -> Self {
        value.clone()
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

fn default_true() -> bool {
    true
}

/// One node of the item store.
///
/// Folders own an ordered list of child ids; leaves keep `children` empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeItem {
    pub id: ItemId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub children: Vec<ItemId>,
    #[serde(default = "default_true")]
    pub can_move: bool,
    #[serde(default = "default_true")]
    pub can_rename: bool,
}

impl TreeItem {
    pub fn new(id: impl Into<ItemId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            is_folder: false,
            children: Vec::new(),
            can_move: true,
            can_rename: true,
        }
    }

    /// Mark this item as a folder, even when it has no children yet.
    pub fn folder(mut self, is_folder: bool) -> Self {
        self.is_folder = is_folder;
        self
    }

    /// Set the children of this item. Implies `folder(true)`.
    pub fn children<I, K>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ItemId>,
    {
        self.is_folder = true;
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn can_move(mut self, can_move: bool) -> Self {
        self.can_move = can_move;
        self
    }

    pub fn can_rename(mut self, can_rename: bool) -> Self {
        self.can_rename = can_rename;
        self
    }
}

/// Read access to the item store.
pub trait TreeDataProvider {
    fn item(&self, id: &ItemId) -> Option<&TreeItem>;

    fn children_of(&self, id: &ItemId) -> &[ItemId] {
        self.item(id)
            .map(|item| item.children.as_slice())
            .unwrap_or(&[])
    }

    fn is_folder(&self, id: &ItemId) -> bool {
        self.item(id).is_some_and(|item| item.is_folder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),
    #[error("item is not a folder: {0}")]
    NotAFolder(ItemId),
    #[error("cannot move {item} into itself or one of its descendants")]
    MoveIntoSelf { item: ItemId },
    #[error("child index {index} out of range for {parent} ({len} children)")]
    ChildIndexOutOfRange {
        parent: ItemId,
        index: usize,
        len: usize,
    },
}

/// An in-memory item store keyed by id, with a single root folder.
#[derive(Clone, Debug)]
pub struct TreeItems {
    root_item: ItemId,
    items: HashMap<ItemId, TreeItem>,
}

impl TreeItems {
    /// Build a store from `items`. A root folder is created when `root_item` is not among them.
    pub fn new(root_item: impl Into<ItemId>, items: impl IntoIterator<Item = TreeItem>) -> Self {
        let root_item = root_item.into();
        let mut items: HashMap<ItemId, TreeItem> =
            items.into_iter().map(|item| (item.id.clone(), item)).collect();
        items
            .entry(root_item.clone())
            .or_insert_with(|| TreeItem::new(root_item.clone(), "").folder(true))
            .is_folder = true;
        Self { root_item, items }
    }

    #[inline]
    pub fn root_item(&self) -> &ItemId {
        &self.root_item
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert or replace an item, returning the previous value.
    pub fn insert(&mut self, item: TreeItem) -> Option<TreeItem> {
        self.items.insert(item.id.clone(), item)
    }

    /// Find the folder holding `id`, and its position among that folder's children.
    pub fn parent_of(&self, id: &ItemId) -> Option<(&ItemId, usize)> {
        self.items.values().find_map(|item| {
            item.children
                .iter()
                .position(|child| child == id)
                .map(|ix| (&item.id, ix))
        })
    }

    /// Whether `id` is `ancestor` or lives anywhere below it.
    pub fn subtree_contains(&self, ancestor: &ItemId, id: &ItemId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent_of(node).map(|(parent, _)| parent);
        }
        false
    }

    /// Apply a completed drop: detach every dragged item and insert them, in order, at `position`.
    ///
    /// Nothing is modified when an error is returned.
    pub fn move_items(
        &mut self,
        dragging_items: &[ItemId],
        position: &DraggingPosition,
    ) -> Result<(), MoveError> {
        let (parent, index) = match position {
            DraggingPosition::Item { target_item, .. } => {
                let target = self
                    .item(target_item)
                    .ok_or_else(|| MoveError::UnknownItem(target_item.clone()))?;
                (target_item.clone(), target.children.len())
            }
            DraggingPosition::BetweenItems {
                parent_item,
                child_index,
                ..
            } => (parent_item.clone(), *child_index),
            DraggingPosition::Root {
                target_item,
                child_index,
                ..
            } => (target_item.clone(), *child_index),
        };

        let parent_item = self
            .item(&parent)
            .ok_or_else(|| MoveError::UnknownItem(parent.clone()))?;
        if !parent_item.is_folder {
            return Err(MoveError::NotAFolder(parent));
        }
        let len = parent_item.children.len();
        if index > len {
            return Err(MoveError::ChildIndexOutOfRange { parent, index, len });
        }

        let mut moving: Vec<ItemId> = Vec::with_capacity(dragging_items.len());
        let mut shift = 0usize;
        for id in dragging_items {
            if moving.contains(id) {
                continue;
            }
            if self.subtree_contains(id, &parent) {
                return Err(MoveError::MoveIntoSelf { item: id.clone() });
            }
            let (current_parent, current_ix) = self
                .parent_of(id)
                .ok_or_else(|| MoveError::UnknownItem(id.clone()))?;
            if *current_parent == parent && current_ix < index {
                shift += 1;
            }
            moving.push(id.clone());
        }

        for id in &moving {
            if let Some((current_parent, current_ix)) =
                self.parent_of(id).map(|(p, ix)| (p.clone(), ix))
                && let Some(node) = self.items.get_mut(&current_parent)
            {
                node.children.remove(current_ix);
            }
        }

        let insert_at = index - shift;
        if let Some(node) = self.items.get_mut(&parent) {
            for (offset, id) in moving.into_iter().enumerate() {
                node.children.insert(insert_at + offset, id);
            }
        }

        log::debug!("moved items into {parent} at {insert_at}");
        Ok(())
    }
}

impl TreeDataProvider for TreeItems {
    fn item(&self, id: &ItemId) -> Option<&TreeItem> {
        self.items.get(id)
    }
}

use crate::item::{ItemId, TreeDataProvider, TreeId};

/// A flat representation of a visible tree item with its depth.
///
/// Root children are at depth `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearItem {
    pub item: ItemId,
    pub depth: usize,
}

/// The parent of a row in a [`LinearTree`].
///
/// Rows at depth `0` hang off the synthetic tree root, which has no row of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinearParent<'a> {
    Root { item: &'a ItemId },
    Row { linear_index: usize, row: &'a LinearItem },
}

impl<'a> LinearParent<'a> {
    #[inline]
    pub fn item(&self) -> &'a ItemId {
        match self {
            Self::Root { item } => item,
            Self::Row { row, .. } => &row.item,
        }
    }

    /// Depth of the parent, `-1` for the synthetic root.
    #[inline]
    pub fn depth(&self) -> isize {
        match self {
            Self::Root { .. } => -1,
            Self::Row { row, .. } => row.depth as isize,
        }
    }

    #[inline]
    pub fn linear_index(&self) -> Option<usize> {
        match self {
            Self::Root { .. } => None,
            Self::Row { linear_index, .. } => Some(*linear_index),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root { .. })
    }
}

/// The visible rows of one tree, in depth-first pre-order.
///
/// Collapsed folders contribute their own row but none of their descendants. A projection is a
/// snapshot: rebuild it whenever the items or the expanded state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearTree {
    tree_id: TreeId,
    root_item: ItemId,
    rows: Vec<LinearItem>,
}

impl LinearTree {
    pub fn build<S, E>(
        tree_id: impl Into<TreeId>,
        root_item: impl Into<ItemId>,
        items: &S,
        is_expanded: E,
    ) -> Self
    where
        S: TreeDataProvider + ?Sized,
        E: Fn(&ItemId) -> bool,
    {
        let root_item = root_item.into();
        let mut rows = Vec::new();
        let mut stack: Vec<(&ItemId, usize)> = items
            .children_of(&root_item)
            .iter()
            .rev()
            .map(|id| (id, 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            rows.push(LinearItem {
                item: id.clone(),
                depth,
            });
            if items.is_folder(id) && is_expanded(id) {
                stack.extend(
                    items
                        .children_of(id)
                        .iter()
                        .rev()
                        .map(|child| (child, depth + 1)),
                );
            }
        }

        Self {
            tree_id: tree_id.into(),
            root_item,
            rows,
        }
    }

    /// Build directly from rows, for hosts that flatten on their own.
    pub fn from_rows(
        tree_id: impl Into<TreeId>,
        root_item: impl Into<ItemId>,
        rows: Vec<LinearItem>,
    ) -> Self {
        Self {
            tree_id: tree_id.into(),
            root_item: root_item.into(),
            rows,
        }
    }

    #[inline]
    pub fn tree_id(&self) -> &TreeId {
        &self.tree_id
    }

    #[inline]
    pub fn root_item(&self) -> &ItemId {
        &self.root_item
    }

    #[inline]
    pub fn rows(&self) -> &[LinearItem] {
        &self.rows
    }

    #[inline]
    pub fn get(&self, linear_index: usize) -> Option<&LinearItem> {
        self.rows.get(linear_index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self, item: &ItemId) -> Option<usize> {
        self.rows.iter().position(|row| row.item == *item)
    }

    /// Find the parent of the row at `linear_index`.
    ///
    /// Scans backwards for the nearest row exactly one level shallower. Returns `None` only when
    /// `linear_index` is out of range.
    pub fn parent_of(&self, linear_index: usize) -> Option<LinearParent<'_>> {
        let row = self.rows.get(linear_index)?;
        if row.depth == 0 {
            return Some(LinearParent::Root {
                item: &self.root_item,
            });
        }

        let parent_depth = row.depth - 1;
        let parent = (0..linear_index)
            .rev()
            .find(|&ix| self.rows[ix].depth == parent_depth)
            .map(|ix| LinearParent::Row {
                linear_index: ix,
                row: &self.rows[ix],
            });

        match parent {
            Some(parent) => Some(parent),
            None => {
                log::warn!(
                    "row {linear_index} of tree {} has no parent row, using the root",
                    self.tree_id
                );
                Some(LinearParent::Root {
                    item: &self.root_item,
                })
            }
        }
    }

    /// Whether any ancestor of the row at `linear_index` is one of `dragging_items`.
    ///
    /// The row itself is not considered.
    pub fn is_descendant(&self, linear_index: usize, dragging_items: &[ItemId]) -> bool {
        let mut ix = linear_index;
        loop {
            match self.parent_of(ix) {
                Some(LinearParent::Row { linear_index, row }) => {
                    if dragging_items.contains(&row.item) {
                        return true;
                    }
                    ix = linear_index;
                }
                Some(LinearParent::Root { .. }) | None => return false,
            }
        }
    }
}

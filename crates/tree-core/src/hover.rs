use crate::item::TreeDataProvider;
use crate::linear::LinearTree;
use crate::policy::DndPolicy;
use crate::position::DropLinePosition;

/// Edge band used when a drop onto the row itself is also possible.
pub const NARROW_EDGE_BAND: f32 = 0.2;
/// Edge band used when only reordering is possible: every point of the row snaps to an edge.
pub const FULL_EDGE_BAND: f32 = 0.5;

/// The row under the pointer, and which part of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoverPosition {
    pub linear_index: usize,
    /// `None` means the pointer is over the row itself rather than one of its edges.
    pub offset: Option<DropLinePosition>,
    /// The pointer is below the last visible row.
    pub very_bottom: bool,
}

impl HoverPosition {
    pub const fn row(linear_index: usize, offset: Option<DropLinePosition>) -> Self {
        Self {
            linear_index,
            offset,
            very_bottom: false,
        }
    }

    pub const fn very_bottom(last_index: usize) -> Self {
        Self {
            linear_index: last_index,
            offset: Some(DropLinePosition::Bottom),
            very_bottom: true,
        }
    }
}

/// Fraction of the row height, from each edge, that snaps to "between items".
pub fn line_threshold(policy: &DndPolicy, is_folder: bool) -> f32 {
    if !policy.can_reorder_items {
        0.0
    } else if policy.allows_drop_on(is_folder) {
        NARROW_EDGE_BAND
    } else {
        FULL_EDGE_BAND
    }
}

/// Map a vertical pointer coordinate onto a row and edge of `tree`.
///
/// `content_top` is the window y of the first row's top edge and `row_height` must be positive.
pub fn resolve_hover<S>(
    pointer_y: f32,
    content_top: f32,
    row_height: f32,
    tree: &LinearTree,
    items: &S,
    policy: &DndPolicy,
) -> HoverPosition
where
    S: TreeDataProvider + ?Sized,
{
    let hovering_position = (pointer_y - content_top) / row_height;
    let linear_index = hovering_position.floor().max(0.0) as usize;

    let Some(row) = tree.get(linear_index) else {
        return HoverPosition::very_bottom(tree.len().saturating_sub(1));
    };

    let threshold = line_threshold(policy, items.is_folder(&row.item));
    let fraction = hovering_position % 1.0;
    // Under the full band the midpoint belongs to the bottom edge.
    let in_bottom_band = if threshold >= FULL_EDGE_BAND {
        fraction >= 1.0 - threshold
    } else {
        fraction > 1.0 - threshold
    };
    let offset = if fraction < threshold {
        Some(DropLinePosition::Top)
    } else if in_bottom_band {
        Some(DropLinePosition::Bottom)
    } else {
        None
    };

    HoverPosition::row(linear_index, offset)
}

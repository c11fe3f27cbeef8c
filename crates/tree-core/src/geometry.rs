use serde::{Deserialize, Serialize};

/// A pointer location in window coordinates (logical pixels).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
}

impl PointerPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Negative or non-finite coordinates are reported by some backends while a drag leaves the
    /// window; they carry no usable location.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x >= 0.0 && self.y >= 0.0
    }
}

/// An axis-aligned rectangle in window coordinates (logical pixels).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Edges count as inside.
    pub fn contains(&self, pointer: PointerPosition) -> bool {
        pointer.x >= self.left
            && pointer.x <= self.right()
            && pointer.y >= self.top
            && pointer.y <= self.bottom()
    }
}

/// Layout of the scrollable tree viewport at the time of a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerGeometry {
    /// Visible bounds of the viewport.
    pub bounds: Bounds,
    /// Height of every row.
    pub row_height: f32,
    /// Vertical scroll offset of the content, `<= 0` once scrolled down.
    #[serde(default)]
    pub scroll_offset: f32,
}

impl ContainerGeometry {
    pub const fn new(bounds: Bounds, row_height: f32) -> Self {
        Self {
            bounds,
            row_height,
            scroll_offset: 0.0,
        }
    }

    pub fn scroll_offset(mut self, scroll_offset: f32) -> Self {
        self.scroll_offset = scroll_offset;
        self
    }

    /// Window y coordinate of the first row's top edge.
    #[inline]
    pub fn content_top(&self) -> f32 {
        self.bounds.top + self.scroll_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_contains_edges() {
        let bounds = Bounds::new(10.0, 20.0, 100.0, 50.0);
        assert!(bounds.contains(PointerPosition::new(10.0, 20.0)));
        assert!(bounds.contains(PointerPosition::new(110.0, 70.0)));
        assert!(!bounds.contains(PointerPosition::new(9.9, 30.0)));
        assert!(!bounds.contains(PointerPosition::new(50.0, 70.1)));
    }

    #[test]
    fn negative_pointer_is_invalid() {
        assert!(PointerPosition::new(0.0, 0.0).is_valid());
        assert!(!PointerPosition::new(-1.0, 4.0).is_valid());
        assert!(!PointerPosition::new(4.0, f32::NAN).is_valid());
    }

    #[test]
    fn content_top_follows_scroll() {
        let geometry = ContainerGeometry::new(Bounds::new(0.0, 40.0, 200.0, 100.0), 20.0)
            .scroll_offset(-60.0);
        assert_eq!(geometry.content_top(), -20.0);
    }
}

//! Screen geometry and the tooltip placement rule.
//!
//! Pointer coordinates are viewport-relative (what a pointer event reports).
//! Tooltip rectangles are page coordinates, i.e. the viewport scroll offset
//! is already applied.

use serde::{Deserialize, Serialize};

/// A point in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero, e.g. an element that has never
    /// been laid out.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `other` lies entirely inside this rectangle (edges inclusive).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// The visible part of the page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal scroll offset of the page.
    #[serde(default)]
    pub scroll_x: f64,
    /// Vertical scroll offset of the page.
    #[serde(default)]
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Viewport of the given size scrolled to the page origin.
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width,
            height,
        }
    }

    pub fn scrolled(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    /// Visible area in page coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.scroll_x, self.scroll_y, self.width, self.height)
    }
}

/// Margins used to place the tooltip next to the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Horizontal distance from the pointer to the tooltip's left edge.
    pub offset_x: f64,
    /// Vertical distance from the pointer to the tooltip's top edge.
    pub offset_y: f64,
    /// Gap kept between the tooltip and a viewport edge it was pushed against.
    pub edge_margin: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            offset_x: 5.0,
            offset_y: 15.0,
            edge_margin: 10.0,
        }
    }
}

impl Placement {
    /// Compute the tooltip rectangle for a pointer position.
    ///
    /// The tooltip goes below-right of the pointer. It is shifted left when it
    /// would cross the right edge, flipped above the pointer when it would
    /// cross the bottom edge, and finally clamped to the top and left margins.
    /// A tooltip that fits in the viewport minus two margins on each axis
    /// always ends up fully visible.
    pub fn place(&self, pointer: Point, size: Size, viewport: &Viewport) -> Rect {
        let mut top = viewport.scroll_y + pointer.y + self.offset_y;
        let mut left = viewport.scroll_x + pointer.x + self.offset_x;

        if left + size.width > viewport.scroll_x + viewport.width {
            left = viewport.scroll_x + viewport.width - size.width - self.edge_margin;
        }

        if top + size.height > viewport.scroll_y + viewport.height {
            top = viewport.scroll_y + pointer.y - size.height - self.edge_margin;
        }

        if top < viewport.scroll_y {
            top = viewport.scroll_y + self.edge_margin;
        }

        if left < viewport.scroll_x {
            left = viewport.scroll_x + self.edge_margin;
        }

        Rect::new(left, top, size.width, size.height)
    }
}

//! Geometric primitives for pixel-space and calibrated-space work.

use bytemuck::{Pod, Zeroable};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 2D point in double precision. Used for raw pixel positions (with
/// sub-pixel accuracy) as well as calibrated coordinates.
pub type Point2 = DVec2;

/// Width and height of a pixel window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if this size fits inside `other` on both axes.
    #[inline]
    pub fn fits_in(self, other: Self) -> bool {
        self.width <= other.width && self.height <= other.height
    }

    /// Number of pixels covered.
    #[inline]
    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Axis-aligned rectangle on the integer pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size around an integer center.
    ///
    /// The top-left corner sits at `center - size / 2` with truncated halves,
    /// so odd and even sizes are both anchored the same way.
    pub fn around(center_x: i32, center_y: i32, size: Size) -> Self {
        Self {
            x: center_x - (size.width / 2) as i32,
            y: center_y - (size.height / 2) as i32,
            width: size.width as i32,
            height: size.height as i32,
        }
    }

    /// Rectangle covering a whole image.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if a pixel is inside the rectangle.
    #[inline]
    pub fn contains(self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Compute intersection with another rectangle.
    pub fn intersection(self, other: Self) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x1 < x2 && y1 < y2 {
            Some(Self::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// Center point in continuous coordinates.
    #[inline]
    pub fn center(self) -> Point2 {
        Point2::new(
            self.x as f64 + self.width as f64 * 0.5,
            self.y as f64 + self.height as f64 * 0.5,
        )
    }
}

//! Tracked samples and their correlation templates.

use kinetrace_core::{GrayImage, PixelRect, Point2, Size, Timestamp};
use serde::{Deserialize, Serialize};

/// A fixed-size block of pixels captured around a tracked point.
///
/// Each template is owned by exactly one [`TrackedPoint`]. Reusing a
/// template for the next sample copies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<f32>,
}

impl Template {
    /// Snapshot the block of `size` around `position` in `frame`.
    ///
    /// The block is aligned on the integer part of the position.
    pub fn capture(frame: &GrayImage, position: Point2, size: Size) -> Self {
        let rect = PixelRect::around(position.x.floor() as i32, position.y.floor() as i32, size);
        let block = frame.crop(rect);
        Self {
            width: block.width,
            height: block.height,
            pixels: block.data,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.pixels[(y * self.width + x) as usize]
    }
}

/// One sample of a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPoint {
    /// Position in raw pixel space.
    pub position: Point2,
    /// Absolute timestamp of the frame this sample belongs to.
    pub timestamp: Timestamp,
    /// Correlation reference for the next frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    /// Match quality in [0, 1].
    pub similarity: f64,
    /// Number of frames since the template was last captured.
    pub template_age: u32,
    /// Placed by the user rather than found by correlation.
    pub manual: bool,
}

impl TrackedPoint {
    /// A point placed by the user, with a freshly captured template.
    pub fn manual(position: Point2, timestamp: Timestamp, template: Option<Template>) -> Self {
        Self {
            position,
            timestamp,
            template,
            similarity: 1.0,
            template_age: 0,
            manual: true,
        }
    }

    /// A bare point without tracking data, as loaded from storage.
    pub fn orphan(position: Point2, timestamp: Timestamp) -> Self {
        Self {
            position,
            timestamp,
            template: None,
            similarity: 1.0,
            template_age: 0,
            manual: false,
        }
    }

    #[inline]
    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// Drop the template, releasing its buffer.
    pub fn reset_track_data(&mut self) {
        self.template = None;
        self.template_age = 0;
    }

    /// Fractional part of the position on both axes.
    #[inline]
    pub fn subpixel_offset(&self) -> Point2 {
        self.position - self.position.floor()
    }
}

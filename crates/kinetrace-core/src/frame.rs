//! Grayscale frames and the frame source interface.
//!
//! The tracker never decodes video. Frames are handed to it by a
//! [`FrameSource`] owned by the surrounding application, as read-only
//! grayscale buffers.

use std::collections::BTreeMap;

use crate::geometry::{PixelRect, Size};
use crate::time::Timestamp;

/// A grayscale image stored as f32 values [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct GrayImage {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl GrayImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0.0; (width * height) as usize],
            width,
            height,
        }
    }

    /// Build an image from a generator evaluated at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True when the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    /// Read a pixel, clamping coordinates to the image edges.
    ///
    /// An empty image reads as 0 everywhere.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, val: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = val;
        }
    }

    /// Copy a rectangular block out of the image.
    ///
    /// Pixels of `rect` falling outside the image replicate the nearest edge.
    pub fn crop(&self, rect: PixelRect) -> GrayImage {
        let width = rect.width.max(0) as u32;
        let height = rect.height.max(0) as u32;
        GrayImage::from_fn(width, height, |x, y| {
            self.get(rect.x + x as i32, rect.y + y as i32)
        })
    }
}

/// Supplies decoded frames by timestamp.
pub trait FrameSource {
    /// The frame displayed at `timestamp`, if the source has it.
    fn frame_at(&self, timestamp: Timestamp) -> Option<&GrayImage>;
}

impl FrameSource for BTreeMap<Timestamp, GrayImage> {
    fn frame_at(&self, timestamp: Timestamp) -> Option<&GrayImage> {
        self.get(&timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_image() {
        let mut img = GrayImage::new(4, 4);
        img.set(2, 3, 0.75);
        assert!((img.get(2, 3) - 0.75).abs() < 0.001);
        assert_eq!(img.get(-1, -1), 0.0);
        assert!((img.get(100, 100) - 0.0).abs() < 0.001);
        assert!((img.get(2, 100) - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_empty_image_reads_as_zero() {
        let img = GrayImage::new(0, 0);
        assert!(img.is_empty());
        assert_eq!(img.get(3, -2), 0.0);
        let block = img.crop(PixelRect::new(-2, -2, 4, 4));
        assert_eq!(block.size(), Size::new(4, 4));
        assert!(block.data.iter().all(|&v| v == 0.0));
        assert!(GrayImage::new(5, 0).is_empty());
    }

    #[test]
    fn test_crop_inside_and_at_edge() {
        let img = GrayImage::from_fn(8, 8, |x, y| (y * 8 + x) as f32);
        let block = img.crop(PixelRect::new(2, 3, 3, 2));
        assert_eq!(block.width, 3);
        assert_eq!(block.height, 2);
        assert_eq!(block.data, vec![26.0, 27.0, 28.0, 34.0, 35.0, 36.0]);

        let edge = img.crop(PixelRect::new(-1, 0, 2, 1));
        assert_eq!(edge.data, vec![0.0, 0.0]);
    }

    #[test]
    fn test_map_frame_source() {
        let mut frames = BTreeMap::new();
        frames.insert(Timestamp::new(10), GrayImage::new(2, 2));
        assert!(frames.frame_at(Timestamp::new(10)).is_some());
        assert!(frames.frame_at(Timestamp::new(11)).is_none());
    }
}

//! The tracking strategy contract.
//!
//! Correlation template matching is the only strategy today. Other
//! approaches (marker centroid, corner detection) plug in behind the same
//! trait.

use kinetrace_core::{GrayImage, PixelRect, Point2, Timestamp};

use crate::error::TrackingResult;
use crate::params::TrackerParameters;
use crate::point::TrackedPoint;

/// Result of tracking one frame.
#[derive(Debug, Clone)]
pub struct TrackOutcome {
    /// The new sample. On a miss this is a fallback at the last position.
    pub point: TrackedPoint,
    /// Whether the point was found in the frame.
    pub matched: bool,
}

/// Geometry a renderer needs to draw the tracker state around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerOverlay {
    pub search: PixelRect,
    pub block: PixelRect,
    pub similarity: f64,
    pub template_age: u32,
}

pub trait TrackingStrategy {
    fn parameters(&self) -> &TrackerParameters;

    /// Locate the last point of `history` in `frame`.
    ///
    /// A missing frame or template, or a best score at or below the
    /// similarity threshold, is not an error: the outcome holds a fallback
    /// point at the last position with `matched == false`.
    fn track(
        &self,
        history: &[TrackedPoint],
        frame: Option<&GrayImage>,
        timestamp: Timestamp,
    ) -> TrackingResult<TrackOutcome>;

    /// Build a point from the frame at the given coordinates, deciding
    /// whether to capture a new template or carry the previous one.
    fn create_point(
        &self,
        manual: bool,
        position: Point2,
        similarity: f64,
        timestamp: Timestamp,
        frame: Option<&GrayImage>,
        history: &[TrackedPoint],
    ) -> TrackedPoint;

    /// Build a point without any tracking data.
    fn create_orphan_point(&self, position: Point2, timestamp: Timestamp) -> TrackedPoint {
        TrackedPoint::orphan(position, timestamp)
    }

    /// Search and block rectangles around a point, for display.
    fn overlay(&self, point: &TrackedPoint) -> TrackerOverlay;

    /// Area the user can grab to edit the tracker around a position.
    fn edit_rectangle(&self, position: Point2) -> PixelRect;
}

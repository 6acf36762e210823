//! Tracker configuration.

use kinetrace_core::Size;
use serde::{Deserialize, Serialize};

/// Parameters of the correlation tracker.
///
/// Supplied by the caller when a tracking session starts. They may change
/// between sessions but not in the middle of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerParameters {
    /// Candidates scoring at or below this value are rejected.
    pub similarity_threshold: f64,
    /// Matches scoring at or above this value refresh the template.
    /// Between `similarity_threshold` and this value the previous template
    /// is kept, to avoid drift from refreshing on marginal matches.
    pub template_update_threshold: f64,
    /// Radius, in score-map cells, of the sub-pixel refinement neighborhood.
    pub refinement_neighborhood: u32,
    /// Size of the area searched around the previous position.
    pub search_window: Size,
    /// Size of the template captured around each point.
    pub block_window: Size,
    /// Discard tracked samples after a point the user moves manually.
    pub reset_on_move: bool,
}

impl TrackerParameters {
    /// Create parameters, widening the search window if the block window
    /// does not fit inside it.
    pub fn new(
        similarity_threshold: f64,
        template_update_threshold: f64,
        refinement_neighborhood: u32,
        search_window: Size,
        block_window: Size,
        reset_on_move: bool,
    ) -> Self {
        Self {
            similarity_threshold,
            template_update_threshold,
            refinement_neighborhood,
            search_window,
            block_window,
            reset_on_move,
        }
        .normalized()
    }

    /// Enforce that the block window fits in the search window.
    pub fn normalized(mut self) -> Self {
        if !self.block_window.fits_in(self.search_window) {
            self.search_window = Size::new(
                self.search_window.width.max(self.block_window.width),
                self.search_window.height.max(self.block_window.height),
            );
        }
        self
    }

    /// True if a match with this score keeps the previous template.
    #[inline]
    pub fn keeps_template(&self, similarity: f64) -> bool {
        similarity >= self.similarity_threshold && similarity < self.template_update_threshold
    }
}

impl Default for TrackerParameters {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            template_update_threshold: 0.8,
            refinement_neighborhood: 1,
            search_window: Size::new(100, 100),
            block_window: Size::new(20, 20),
            reset_on_move: false,
        }
    }
}

/// Unit in which a tracking profile expresses window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowUnit {
    #[default]
    Pixels,
    /// Percentage of the frame size.
    Percentage,
}

/// User-level tracking preferences, resolved against a frame size into
/// concrete [`TrackerParameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingProfile {
    pub similarity_threshold: f64,
    pub template_update_threshold: f64,
    pub refinement_neighborhood: u32,
    pub search_window: Size,
    pub search_window_unit: WindowUnit,
    pub block_window: Size,
    pub block_window_unit: WindowUnit,
}

impl Default for TrackingProfile {
    fn default() -> Self {
        let params = TrackerParameters::default();
        Self {
            similarity_threshold: params.similarity_threshold,
            template_update_threshold: params.template_update_threshold,
            refinement_neighborhood: params.refinement_neighborhood,
            search_window: params.search_window,
            search_window_unit: WindowUnit::Pixels,
            block_window: params.block_window,
            block_window_unit: WindowUnit::Pixels,
        }
    }
}

impl TrackingProfile {
    /// Resolve the profile for footage of the given frame size.
    pub fn to_parameters(&self, frame_size: Size) -> TrackerParameters {
        TrackerParameters::new(
            self.similarity_threshold,
            self.template_update_threshold,
            self.refinement_neighborhood,
            resolve(self.search_window, self.search_window_unit, frame_size),
            resolve(self.block_window, self.block_window_unit, frame_size),
            false,
        )
    }
}

fn resolve(window: Size, unit: WindowUnit, frame_size: Size) -> Size {
    match unit {
        WindowUnit::Pixels => window,
        WindowUnit::Percentage => Size::new(
            (frame_size.width as f64 * window.width as f64 / 100.0) as u32,
            (frame_size.height as f64 * window.height as f64 / 100.0) as u32,
        ),
    }
}

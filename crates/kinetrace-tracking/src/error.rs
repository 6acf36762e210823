//! Error types for the tracking subsystem.
//!
//! Correlation misses are not errors: they produce a fallback point and a
//! `matched = false` outcome. Errors here are caller contract violations.

use kinetrace_core::{KineTraceError, Timestamp};
use thiserror::Error;

/// Errors that can occur in tracking operations.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Tracking needs at least one previous point.
    #[error("Tracking history is empty")]
    EmptyHistory,

    /// Samples must be appended in strictly increasing time order.
    #[error("Timestamp {given} is not after the last tracked sample at {last}")]
    NonIncreasingTimestamp { last: Timestamp, given: Timestamp },

    /// A point index outside the trajectory.
    #[error("Point index {index} out of range for trajectory of {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    /// Core error (serialization, IO).
    #[error(transparent)]
    Core(#[from] KineTraceError),
}

/// Result type alias for tracking operations.
pub type TrackingResult<T> = std::result::Result<T, TrackingError>;

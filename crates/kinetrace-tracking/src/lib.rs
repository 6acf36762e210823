//! KineTrace Tracking - Following a user-marked point across frames.
//!
//! A point is located in each new frame by normalized cross-correlation of
//! a template captured around its previous position, refined to sub-pixel
//! accuracy from the neighboring correlation scores.

pub mod correlation;
pub mod error;
pub mod params;
pub mod persist;
pub mod point;
pub mod session;
pub mod strategy;
pub mod trajectory;

pub use correlation::{CorrelationTracker, ScoreMap};
pub use error::{TrackingError, TrackingResult};
pub use params::{TrackerParameters, TrackingProfile, WindowUnit};
pub use persist::TrajectoryFile;
pub use point::{Template, TrackedPoint};
pub use session::{TrackingSession, TrackingState};
pub use strategy::{TrackOutcome, TrackerOverlay, TrackingStrategy};
pub use trajectory::Trajectory;

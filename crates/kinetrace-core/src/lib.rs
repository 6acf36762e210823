//! KineTrace Core - Foundation types for motion analysis
//!
//! This crate provides the fundamental types shared by the tracker and the
//! kinematics engine:
//! - Time representation (Timestamp, FrameRate)
//! - Grayscale frames and the frame source interface
//! - Geometric primitives
//! - The calibration collaborator interface

pub mod calibration;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod time;

pub use calibration::{AngleUnit, Calibration, UniformCalibration};
pub use error::{KineTraceError, Result};
pub use frame::{FrameSource, GrayImage};
pub use geometry::{PixelRect, Point2, Size};
pub use time::{FrameRate, Timestamp};

/// The "not computable" sentinel stored in derived series.
pub const UNDEFINED: f64 = f64::NAN;

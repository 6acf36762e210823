//! Error types for the kinematics engine.
//!
//! Degenerate input is not an error here: short trajectories produce
//! undefined series and failed circle fits produce an empty circle.

use kinetrace_core::KineTraceError;
use thiserror::Error;

use crate::series::Quantity;

#[derive(Debug, Error)]
pub enum KinematicsError {
    /// A series does not line up with the trajectory it belongs to.
    #[error("Series {quantity:?} has {got} samples, expected {expected}")]
    LengthMismatch {
        quantity: Quantity,
        expected: usize,
        got: usize,
    },

    /// Trajectories combined into one measurement do not share samples.
    #[error("Trajectories do not share the same samples ({0})")]
    MisalignedTrajectories(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] KineTraceError),
}

pub type KinematicsResult<T> = std::result::Result<T, KinematicsError>;

//! Error types for KineTrace.

use thiserror::Error;

/// Main error type for KineTrace operations.
#[derive(Error, Debug)]
pub enum KineTraceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for KineTrace operations.
pub type Result<T> = std::result::Result<T, KineTraceError>;

//! Error types for calplan.

use thiserror::Error;

/// Errors that can occur in calplan operations.
#[derive(Error, Debug)]
pub enum CalPlanError {
    #[error("Invalid range: end ({end}) must be after start ({start})")]
    InvalidRange { start: String, end: String },

    #[error("Index {index} is out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Split percent must be between 0 and 100, got {0}")]
    InvalidSplitPercent(f64),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalPlanError {
    /// Wrap any displayable error from a remote service call.
    pub fn remote(err: impl std::fmt::Display) -> Self {
        CalPlanError::Remote(format!("{err:#}"))
    }
}

/// Result type alias for calplan operations.
pub type CalPlanResult<T> = Result<T, CalPlanError>;

//! Error types for the patchwright-queue crate

use thiserror::Error;

/// Result type alias for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Error type for queue operations
#[derive(Error, Debug)]
pub enum QueueError {
    /// Backend failure
    #[error("Queue backend error: {0}")]
    Backend(String),

    /// Unknown job id
    #[error("Job not found: {0}")]
    NotFound(String),

    /// Status requested by someone other than the job owner
    #[error("Job {0} is owned by another user")]
    Unauthorized(String),

    /// Payload (de)serialization failure
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for QueueError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

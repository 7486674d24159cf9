//! Error types for the patchwright-vector-data crate

use thiserror::Error;

/// Result type alias for vector storage operations
pub type VectorDataResult<T> = Result<T, VectorDataError>;

/// Error type for vector storage operations
#[derive(Error, Debug)]
pub enum VectorDataError {
    /// Storage backend errors (connection, query, upsert failures)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Dimension mismatch between a vector and the collection
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for VectorDataError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

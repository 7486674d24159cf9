//! Error types for the patchwright-meta-data crate

use thiserror::Error;

/// Result type alias for metadata operations
pub type MetaDataResult<T> = Result<T, MetaDataError>;

/// Error type for metadata operations
#[derive(Error, Debug)]
pub enum MetaDataError {
    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization failure (persisted BM25 state, payloads)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record lookup failed
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

//! Error types for the patchwright-lexical crate

use thiserror::Error;

/// Result type alias for lexical index operations
pub type LexicalResult<T> = Result<T, LexicalError>;

/// Error type for lexical index operations
#[derive(Error, Debug)]
pub enum LexicalError {
    /// Persistence backend failed to load or save index state
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization failure while persisting or restoring an index
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

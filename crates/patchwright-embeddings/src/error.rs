//! Error types for the patchwright-embeddings crate

use thiserror::Error;

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Error type for embedding operations
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider rejected the request or returned a malformed response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network and transport errors
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration and environment errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<anyhow::Error> for EmbeddingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

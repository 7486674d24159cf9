//! Error types for the patchwright-search crate

use thiserror::Error;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Error type for hybrid search operations
#[derive(Error, Debug)]
pub enum SearchError {
    /// Query embedding failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector backend failed
    #[error("Vector storage error: {0}")]
    VectorStorage(String),

    /// Lexical index failed to load
    #[error("Lexical index error: {0}")]
    Lexical(String),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<patchwright_embeddings::EmbeddingError> for SearchError {
    fn from(err: patchwright_embeddings::EmbeddingError) -> Self {
        Self::Embedding(err.to_string())
    }
}

impl From<patchwright_vector_data::VectorDataError> for SearchError {
    fn from(err: patchwright_vector_data::VectorDataError) -> Self {
        Self::VectorStorage(err.to_string())
    }
}

impl From<patchwright_lexical::LexicalError> for SearchError {
    fn from(err: patchwright_lexical::LexicalError) -> Self {
        Self::Lexical(err.to_string())
    }
}

//! Error types for the patchwright-indexing crate

use thiserror::Error;

/// Result type alias for indexing operations
pub type IndexingResult<T> = Result<T, IndexingError>;

/// Error type for indexing operations
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Clone URL rejected before any work happened
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    /// Index-state invariants violated (zero chunks, zero vectors)
    ///
    /// The job fails and meta is NOT committed.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Clone or file operation failure in the sandbox
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// Lexical index failure
    #[error("Lexical error: {0}")]
    Lexical(String),

    /// Vector storage failure
    #[error("Vector storage error: {0}")]
    VectorStorage(String),

    /// Metadata store failure
    #[error("Metadata error: {0}")]
    MetaData(String),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<patchwright_sandbox::SandboxError> for IndexingError {
    fn from(err: patchwright_sandbox::SandboxError) -> Self {
        Self::Sandbox(err.to_string())
    }
}

impl From<patchwright_lexical::LexicalError> for IndexingError {
    fn from(err: patchwright_lexical::LexicalError) -> Self {
        Self::Lexical(err.to_string())
    }
}

impl From<patchwright_vector_data::VectorDataError> for IndexingError {
    fn from(err: patchwright_vector_data::VectorDataError) -> Self {
        Self::VectorStorage(err.to_string())
    }
}

impl From<patchwright_meta_data::MetaDataError> for IndexingError {
    fn from(err: patchwright_meta_data::MetaDataError) -> Self {
        Self::MetaData(err.to_string())
    }
}

//! Error types for the patchwright-generation crate

use thiserror::Error;

/// Result type alias for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Error type for generation operations
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Generation requested against an unindexed repository
    #[error("Repository may not be indexed yet")]
    NotIndexed,

    /// Upstream indexing job didn't reach a terminal state in time
    #[error("Timed out waiting for indexing job {0}")]
    IndexingWaitTimeout(String),

    /// Upstream indexing job failed
    #[error("Indexing job {job_id} failed: {reason}")]
    IndexingFailed { job_id: String, reason: String },

    /// The generate-validate loop exhausted its iterations
    #[error("Validation failed after {iterations} iterations: {}", errors.join("; "))]
    ValidationExhausted {
        iterations: u32,
        errors: Vec<String>,
    },

    /// Sandbox failure
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// LLM provider/schema failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Hybrid retrieval failure
    #[error("Search error: {0}")]
    Search(String),

    /// Validator failure (running checks, not check outcomes)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Forge provider failure
    #[error("Forge error: {0}")]
    Forge(String),

    /// Metadata store failure
    #[error("Metadata error: {0}")]
    MetaData(String),

    /// Queue lookup failure while waiting on indexing
    #[error("Queue error: {0}")]
    Queue(String),

    /// Clone URL rejected
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<patchwright_sandbox::SandboxError> for GenerationError {
    fn from(err: patchwright_sandbox::SandboxError) -> Self {
        Self::Sandbox(err.to_string())
    }
}

impl From<patchwright_llm::LlmError> for GenerationError {
    fn from(err: patchwright_llm::LlmError) -> Self {
        Self::Llm(err.to_string())
    }
}

impl From<patchwright_search::SearchError> for GenerationError {
    fn from(err: patchwright_search::SearchError) -> Self {
        Self::Search(err.to_string())
    }
}

impl From<patchwright_validation::ValidationError> for GenerationError {
    fn from(err: patchwright_validation::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<patchwright_forge::ForgeError> for GenerationError {
    fn from(err: patchwright_forge::ForgeError) -> Self {
        Self::Forge(err.to_string())
    }
}

impl From<patchwright_meta_data::MetaDataError> for GenerationError {
    fn from(err: patchwright_meta_data::MetaDataError) -> Self {
        Self::MetaData(err.to_string())
    }
}

impl From<patchwright_queue::QueueError> for GenerationError {
    fn from(err: patchwright_queue::QueueError) -> Self {
        Self::Queue(err.to_string())
    }
}

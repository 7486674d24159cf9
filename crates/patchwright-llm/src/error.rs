//! Error types for the patchwright-llm crate

use thiserror::Error;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Error type for LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Provider rejected the request or returned an unusable response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network and transport errors
    #[error("Network error: {0}")]
    Network(String),

    /// Model output did not match the expected schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

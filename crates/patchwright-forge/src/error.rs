//! Error types for the patchwright-forge crate

use thiserror::Error;

/// Result type alias for forge operations
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Error type for forge operations
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Forge API rejected the request
    #[error("Forge API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network and transport errors
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials missing or rejected
    #[error("Auth error: {0}")]
    Auth(String),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

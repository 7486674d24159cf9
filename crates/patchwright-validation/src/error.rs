//! Error types for the patchwright-validation crate

use thiserror::Error;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Error type for validation operations
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Sandbox failure while running a check
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<patchwright_sandbox::SandboxError> for ValidationError {
    fn from(err: patchwright_sandbox::SandboxError) -> Self {
        Self::Sandbox(err.to_string())
    }
}

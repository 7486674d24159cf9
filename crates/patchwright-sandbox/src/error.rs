//! Error types for the patchwright-sandbox crate

use thiserror::Error;

/// Result type alias for sandbox operations
pub type SandboxResult<T> = Result<T, SandboxError>;

/// Error type for sandbox operations
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Sandbox provider/backend failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Command exceeded its timeout
    #[error("Command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    /// Requested file missing inside the sandbox
    #[error("File not found in sandbox: {0}")]
    FileNotFound(String),

    /// I/O failure inside the sandbox workspace
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

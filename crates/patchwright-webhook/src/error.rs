//! Error types for the patchwright-webhook crate

use thiserror::Error;

/// Result type alias for webhook operations
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook operations
#[derive(Error, Debug)]
pub enum WebhookError {
    /// HMAC signature missing or mismatched (mapped to 403 at the edge)
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Body didn't parse as the expected event payload (mapped to 400)
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Bookkeeping store failure
    #[error("Metadata error: {0}")]
    MetaData(String),

    /// Queue failure while enqueueing the indexing job
    #[error("Queue error: {0}")]
    Queue(String),

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<patchwright_meta_data::MetaDataError> for WebhookError {
    fn from(err: patchwright_meta_data::MetaDataError) -> Self {
        Self::MetaData(err.to_string())
    }
}

impl From<patchwright_queue::QueueError> for WebhookError {
    fn from(err: patchwright_queue::QueueError) -> Self {
        Self::Queue(err.to_string())
    }
}

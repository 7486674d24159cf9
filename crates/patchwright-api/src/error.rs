//! Error handling for the Patchwright API
//!
//! Maps core error kinds onto HTTP statuses: invalid input to 400, signature
//! and ownership failures to 403, unknown resources to 404, upstream
//! provider trouble to 502, everything else to 500.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use patchwright_common::{CommonError, impl_common_conversions};
use thiserror::Error;

/// The main error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Bad webhook signature or job ownership mismatch
    #[error("Forbidden: {0}")]
    AuthFailure(String),

    /// Unknown job or repository
    #[error("Not found: {0}")]
    NotFound(String),

    /// An external provider (queue backend, forge, LLM) is unavailable
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::AuthFailure(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

// Standard conversions (io, anyhow) route through the shared trait
impl CommonError for ApiError {
    fn io_error(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn config_error(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn parse_error(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    fn other_error(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl_common_conversions!(ApiError);

impl From<patchwright_queue::QueueError> for ApiError {
    fn from(err: patchwright_queue::QueueError) -> Self {
        match err {
            patchwright_queue::QueueError::NotFound(id) => Self::NotFound(format!("job {id}")),
            patchwright_queue::QueueError::Unauthorized(id) => {
                Self::AuthFailure(format!("job {id}"))
            }
            other => Self::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl From<patchwright_webhook::WebhookError> for ApiError {
    fn from(err: patchwright_webhook::WebhookError) -> Self {
        match err {
            patchwright_webhook::WebhookError::InvalidSignature => {
                Self::AuthFailure("invalid webhook signature".to_string())
            }
            patchwright_webhook::WebhookError::MalformedPayload(e) => {
                Self::InvalidInput(format!("malformed webhook payload: {e}"))
            }
            other => Self::UpstreamUnavailable(other.to_string()),
        }
    }
}

/// A specialized `Result` type for API handlers
pub type Result<T> = std::result::Result<T, ApiError>;

//! Webhook endpoint
//!
//! Signature verification happens over the RAW request body before any
//! parsing; a bad or missing signature is a 403 with no further processing.

use crate::error::Result;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Json, Router, routing::post};
use patchwright_webhook::{DispatchOutcome, verify_signature};
use serde::Serialize;
use utoipa::ToSchema;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const EVENT_HEADER: &str = "x-github-event";

/// Acknowledgement body
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook", post(webhook_handler))
}

async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    verify_signature(&state.webhook_secret, &body, signature)
        .map_err(crate::error::ApiError::from)?;

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let outcome = state.dispatcher.dispatch(event, &body).await?;
    let response = match outcome {
        DispatchOutcome::Enqueued { job_id, full } => WebhookResponse {
            message: if full {
                "full indexing queued".to_string()
            } else {
                "incremental indexing queued".to_string()
            },
            job_id: Some(job_id),
        },
        DispatchOutcome::InstallationHandled => WebhookResponse {
            message: "installation updated".to_string(),
            job_id: None,
        },
        DispatchOutcome::NotHandled => WebhookResponse {
            message: "event not handled".to_string(),
            job_id: None,
        },
    };

    Ok(Json(response))
}

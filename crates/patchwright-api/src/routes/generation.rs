//! Generation job submission and status routes
//!
//! `POST /generation` accepts a natural-language task against a repository
//! and enqueues a generation job; the caller polls the returned status URL.
//! Status lookups are owner-checked: a `userId` that doesn't match the job's
//! owner gets 403, never the job data.

use crate::error::{ApiError, Result};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use patchwright_queue::{EnqueueOptions, ProcessTaskPayload, QueueName};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload for starting a generation task
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Clone URL of the target repository
    pub repo_url: String,
    /// The natural-language task
    pub task: String,
    /// Repository identifier (`owner/name`)
    pub repo_id: String,
    /// Optional indexing job to wait on before generating
    #[serde(default)]
    pub indexing_job_id: Option<String>,
    /// Requesting user (owner of the job)
    pub user_id: String,
    /// Display name of the requesting user
    pub username: String,
}

/// 202 response carrying the job handle
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationAccepted {
    pub job_id: String,
    pub status_url: String,
}

/// Job status projection
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub state: String,
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
}

/// Full job details including the result payload
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobDetailsResponse {
    pub job_id: String,
    pub state: String,
    pub progress: i32,
    pub attempts: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
}

/// Owner identification for status lookups
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub user_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/generation", post(submit_handler))
        .route("/generation/{job_id}", get(status_handler))
        .route("/generation/{job_id}/details", get(details_handler))
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<(StatusCode, Json<GenerationAccepted>)> {
    if request.task.trim().is_empty() {
        return Err(ApiError::InvalidInput("task must not be empty".to_string()));
    }
    if request.repo_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("repoId must not be empty".to_string()));
    }

    let payload = ProcessTaskPayload {
        repo_url: request.repo_url,
        task: request.task,
        repo_id: request.repo_id,
        indexing_job_id: request.indexing_job_id,
        installation_token: None,
        installation_id: None,
        user_id: request.user_id.clone(),
        username: request.username,
    };

    let job_id = state
        .queue
        .enqueue(
            QueueName::Generation,
            serde_json::to_value(&payload)
                .map_err(|e| ApiError::Internal(e.to_string()))?,
            EnqueueOptions {
                owner_user_id: Some(request.user_id),
                ..EnqueueOptions::default()
            },
        )
        .await?;

    tracing::info!(job_id = %job_id, "Generation job accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(GenerationAccepted {
            status_url: format!("/generation/{job_id}"),
            job_id,
        }),
    ))
}

async fn status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<JobStatusResponse>> {
    let job = state.queue.status_for_user(&job_id, &owner.user_id).await?;

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        state: job.state.to_string(),
        progress: job.progress,
        failed_reason: job.failed_reason,
    }))
}

async fn details_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<JobDetailsResponse>> {
    let job = state.queue.status_for_user(&job_id, &owner.user_id).await?;

    Ok(Json(JobDetailsResponse {
        job_id: job.id,
        state: job.state.to_string(),
        progress: job.progress,
        attempts: job.attempts,
        result: job.result,
        failed_reason: job.failed_reason,
    }))
}

//! Manual indexing routes
//!
//! `POST /index` enqueues a full index of a repository branch outside the
//! webhook path (first-time setup, manual re-baseline).

use crate::error::{ApiError, Result};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use patchwright_queue::{EnqueueOptions, IndexRepoPayload, QueueName};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::generation::{JobStatusResponse, OwnerQuery};

/// Request payload for indexing a repository
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest {
    /// Clone URL of the repository
    pub repo_url: String,
    /// Repository identifier (`owner/name`)
    pub repo_id: String,
    /// Branch to index (defaults to main)
    #[serde(default)]
    pub branch: Option<String>,
    /// Requesting user (owner of the job)
    pub user_id: String,
    /// Display name of the requesting user
    pub username: String,
}

/// 202 response carrying the job handle
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndexAccepted {
    pub job_id: String,
    pub status_url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/index", post(submit_handler))
        .route("/index/{job_id}", get(status_handler))
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<IndexRequest>,
) -> Result<(StatusCode, Json<IndexAccepted>)> {
    if request.repo_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("repoId must not be empty".to_string()));
    }

    let branch = request.branch.unwrap_or_else(|| "main".to_string());
    let payload = IndexRepoPayload {
        project_id: request.repo_id.clone(),
        repo_url: request.repo_url,
        repo_id: request.repo_id,
        branch,
        installation_token: None,
        installation_id: None,
        user_id: request.user_id.clone(),
        username: request.username,
        timestamp: chrono::Utc::now().timestamp_millis(),
        trigger: Some("api".to_string()),
        event: None,
        pusher: None,
        before_sha: None,
        after_sha: None,
    };

    let job_id = state
        .queue
        .enqueue(
            QueueName::Indexing,
            serde_json::to_value(&payload)
                .map_err(|e| ApiError::Internal(e.to_string()))?,
            EnqueueOptions {
                owner_user_id: Some(request.user_id),
                ..EnqueueOptions::default()
            },
        )
        .await?;

    tracing::info!(job_id = %job_id, "Indexing job accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(IndexAccepted {
            status_url: format!("/index/{job_id}"),
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

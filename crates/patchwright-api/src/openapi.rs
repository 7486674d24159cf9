//! OpenAPI document aggregation

use crate::routes::generation::{
    GenerationAccepted, GenerationRequest, JobDetailsResponse, JobStatusResponse,
};
use crate::routes::health::HealthResponse;
use crate::routes::index::{IndexAccepted, IndexRequest};
use crate::routes::webhook::WebhookResponse;
use axum::Json;
use utoipa::OpenApi;

/// API document covering the thin HTTP surface
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Patchwright API",
        description = "AI-assisted code modification: submit tasks, poll jobs, receive webhooks",
    ),
    components(schemas(
        GenerationRequest,
        GenerationAccepted,
        JobStatusResponse,
        JobDetailsResponse,
        IndexRequest,
        IndexAccepted,
        WebhookResponse,
        HealthResponse,
    ))
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub mod generation;
pub mod health;
pub mod index;
pub mod webhook;

use crate::AppState;
use axum::Router;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(generation::routes())
        .merge(index::routes())
        .merge(webhook::routes())
        .route(
            "/api-docs/openapi.json",
            axum::routing::get(crate::openapi::openapi_json),
        )
        .with_state(state)
}

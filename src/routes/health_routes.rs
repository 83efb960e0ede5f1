//! Health check endpoints.

use crate::state::AppState;
use axum::{
    Router,
    body::Body,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde_json::json;

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health_check))
}

/// Static liveness document. Never triggers a collection.
async fn status() -> impl IntoResponse {
    Json(json!({ "status": "running" }))
}

/// Simple health check endpoint.
async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}

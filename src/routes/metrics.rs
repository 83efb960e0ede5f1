//! Metrics exposition endpoint.

use std::net::SocketAddr;

use crate::metrics::CONTENT_TYPE;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{
    Router,
    extract::{ConnectInfo, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use tracing::{error, info};

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Every call runs a full collection cycle before rendering. The cycle blocks
/// for the CPU sampling window, so it runs on the blocking pool. A failed
/// cycle still answers 200 with the last known values.
async fn metrics_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Result<impl IntoResponse, HTTPError> {
    let client = connect_info
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    info!(client = %client, "Received request for /metrics from {}", client);

    let exporter = state.exporter.clone();
    let (report, text) = tokio::task::spawn_blocking(move || exporter.scrape())
        .await
        .map_err(|e| {
            error!(error = %e, "Metrics collection task failed");
            HTTPError::internal("metrics collection task failed")
        })?
        .map_err(|e| {
            error!(error = %e, "Failed to render metrics");
            HTTPError::internal(e.to_string())
        })?;

    if let Some(failure) = &report.failure {
        info!(
            family = %failure.family,
            "Serving stale values for families not refreshed this cycle"
        );
    }

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], text))
}

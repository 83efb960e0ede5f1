//! Application startup and server initialization.
//!
//! Builds the platform capability, the probe and the gauge registry, then
//! serves the routes until the process is interrupted.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::metrics::{Collector, CollectorSettings, Exporter};
use crate::platform;
use crate::probe::SysinfoProbe;
use crate::routes;
use crate::state::AppState;

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the host topology cannot be enumerated, if the server
/// fails to bind to the configured address, or if serving fails.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let platform = platform::detect();
    info!(platform = platform.name(), "Detected host platform");

    let collector = Collector::new(
        platform.clone(),
        Box::new(SysinfoProbe::new()),
        CollectorSettings::from(&config.collector),
    )?;
    platform.log_session_telemetry();

    let state = AppState::new(Exporter::new(collector));
    let app = routes::create_router(state);

    info!("Starting server on {}", config.bind_address);
    let listener = TcpListener::bind(&config.bind_address).await?;
    info!(
        "Started Prometheus HTTP server on {}",
        listener.local_addr()?
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutting down metrics collector application");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

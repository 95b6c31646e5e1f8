//! Application startup and server initialization.
//!
//! This module wires the backend, the nightly collector and the metrics registry
//! together and serves them over HTTP.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use crate::backend::{create_backend, Backend};
use crate::config::ConfigV1;
use crate::metrics::{Metrics, NightlyCollector};
use crate::routes;
use crate::state::AppState;
use crate::utils::log_throttle::LogThrottle;

/// Identical scrape failures are logged at most once per this window.
const SCRAPE_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Builds the shared state around an already created backend.
///
/// This is where the collector gets registered, exactly once per process.
pub fn build_state(
    config: &ConfigV1,
    backend: Arc<dyn Backend>,
) -> Result<AppState, prometheus::Error> {
    let collector = Arc::new(NightlyCollector::new(backend)?);
    let metrics = Metrics::new(collector, &config.metrics)?;

    Ok(AppState {
        metrics,
        log_throttle: Arc::new(LogThrottle::new(SCRAPE_ERROR_LOG_INTERVAL)),
    })
}

/// Initializes and runs the exporter.
///
/// Binds to the address specified in the configuration and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the metrics cannot be registered, the server fails to bind
/// to the specified address, or it encounters a runtime error during execution.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&config.backend).await;
    info!(backend = backend.get_name(), "Backend ready");

    let state = build_state(&config, backend)?;
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Serving metrics on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

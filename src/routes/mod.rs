//! HTTP route definitions and handlers.
//!
//! Only two endpoints exist: the Prometheus scrape target and a liveness probe.
//! Every request, including ones that match no route, is timed by the
//! [`track_metrics`] middleware.

mod health_routes;
mod metrics_routes;
mod middleware;

use crate::state::AppState;
use axum::Router;

pub use middleware::track_metrics;

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router and attaches
/// the application state for access in handlers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(metrics_routes::routes())
        .merge(health_routes::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_metrics,
        ))
        .with_state(state)
}

//! Health check endpoints.

use crate::state::AppState;
use axum::{
    body::Body,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness only: the backend is not consulted, so a broken backend shows up as
/// failed scrapes rather than a dead process.
async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}

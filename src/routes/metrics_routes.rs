//! Metrics exposition endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use http::header::CONTENT_TYPE;
use tracing::error;

use crate::metrics::TEXT_CONTENT_TYPE;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Every call reads the backend afresh. When that fails the scrape fails as a whole:
/// no metrics are returned, only a JSON error body.
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    match state.metrics.render().await {
        Ok(body) => Ok((StatusCode::OK, [(CONTENT_TYPE, TEXT_CONTENT_TYPE)], body)),
        Err(e) => {
            if let Some(suppressed) = state.log_throttle.should_emit(e.kind()) {
                error!(error = %e, suppressed, "Scrape failed");
            }
            Err(HTTPError::from(&e))
        }
    }
}

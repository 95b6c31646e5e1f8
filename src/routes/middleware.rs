//! Request metrics middleware.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::metrics::MetricsRecorder;
use crate::state::AppState;

/// Times each request and records it against the route pattern it matched.
///
/// Installed with `Router::layer`, so it also wraps the fallback. Requests that hit no
/// route carry no `MatchedPath` and are grouped as `unmatched`; the raw path is never
/// used as a label.
pub async fn track_metrics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    debug!(%method, endpoint = %endpoint, status, elapsed, "Served request");
    state
        .metrics
        .record_request(method.as_str(), &endpoint, status, elapsed);

    response
}

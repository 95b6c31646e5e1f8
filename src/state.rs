//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! the metrics registry with its nightly collector, and the throttle for
//! repetitive error logs.

use crate::metrics::Metrics;
use crate::utils::log_throttle::LogThrottle;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Registry and nightly collector, created once per process.
    pub metrics: Metrics,
    /// Limits how often identical scrape failures are logged.
    pub log_throttle: Arc<LogThrottle>,
}

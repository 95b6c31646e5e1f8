//! Metrics recording implementation using Prometheus.

use std::sync::Arc;

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, HistogramVec,
    IntCounterVec, Opts, Registry,
};
use thiserror::Error;

use super::collector::NightlyCollector;
use super::exposition::encode;
use crate::backend::BackendError;
use crate::config::MetricsConfig;

/// A scrape that could not produce any output.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}

impl ScrapeError {
    /// Short, stable identifier used for log keys.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Backend(e) => e.kind(),
            ScrapeError::Encode(_) => "encode",
        }
    }
}

/// Trait for recording the exporter's own HTTP traffic.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records one served request, grouped by matched route.
    fn record_request(&self, method: &str, endpoint: &str, status: u16, duration_secs: f64);
}

/// Process-wide metrics: the registry with HTTP request metrics, plus the nightly
/// collector registered as the source of the `nightly_*` families.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    collector: Arc<NightlyCollector>,

    http_requests_total: IntCounterVec,
    http_requests_errors_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Creates the registry and takes the nightly collector as the one source of the
    /// `nightly_*` families.
    ///
    /// Call once at startup; the collector must not be handed to any other sink.
    pub fn new(
        collector: Arc<NightlyCollector>,
        config: &MetricsConfig,
    ) -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let http_requests_total = register_int_counter_vec_with_registry!(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "status"],
            registry.clone()
        )?;

        let http_requests_errors_total = register_int_counter_vec_with_registry!(
            Opts::new(
                "http_requests_errors_total",
                "Total number of HTTP requests that ended in a server error"
            ),
            &["method", "endpoint"],
            registry.clone()
        )?;

        let buckets = config
            .http_buckets
            .clone()
            .unwrap_or_else(|| prometheus::DEFAULT_BUCKETS.to_vec());
        let http_request_duration_seconds = register_histogram_vec_with_registry!(
            "http_request_duration_seconds",
            "HTTP request duration in seconds, grouped by endpoint",
            &["method", "endpoint", "status"],
            buckets,
            registry.clone()
        )?;

        Ok(Metrics {
            registry,
            collector,
            http_requests_total,
            http_requests_errors_total,
            http_request_duration_seconds,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Renders all metrics in Prometheus text format.
    ///
    /// The nightly families come first, fetched fresh from the backend; a backend
    /// failure fails the whole render rather than serving partial data.
    pub async fn render(&self) -> Result<String, ScrapeError> {
        let mut families = self.collector.collect().await?;
        families.extend(self.registry.gather());
        Ok(encode(&families)?)
    }
}

impl MetricsRecorder for Metrics {
    fn record_request(&self, method: &str, endpoint: &str, status: u16, duration_secs: f64) {
        let status_label = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, &status_label])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint, &status_label])
            .observe(duration_secs);
        if status >= 500 {
            self.http_requests_errors_total
                .with_label_values(&[method, endpoint])
                .inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory_backend::MemoryBackend;
    use crate::backend::Snapshot;
    use chrono::Utc;

    fn metrics() -> (Metrics, MemoryBackend) {
        let backend = MemoryBackend::new();
        let collector = Arc::new(NightlyCollector::new(Arc::new(backend.clone())).unwrap());
        let metrics = Metrics::new(collector, &MetricsConfig::default()).unwrap();
        (metrics, backend)
    }

    #[test]
    fn record_request_increments_counter_and_histogram() {
        let (metrics, _) = metrics();

        metrics.record_request("GET", "/metrics", 200, 0.01);
        metrics.record_request("GET", "/metrics", 200, 0.02);
        metrics.record_request("GET", "/health", 200, 0.001);

        let families = metrics.registry().gather();
        let total = families
            .iter()
            .find(|f| f.get_name() == "http_requests_total")
            .expect("counter not found");
        assert_eq!(total.get_metric().len(), 1);
        assert_eq!(total.get_metric()[0].get_counter().get_value(), 3.0);

        let duration = families
            .iter()
            .find(|f| f.get_name() == "http_request_duration_seconds")
            .expect("histogram not found");
        assert_eq!(duration.get_metric().len(), 2);
    }

    #[test]
    fn server_errors_are_counted_per_endpoint() {
        let (metrics, _) = metrics();

        metrics.record_request("GET", "/metrics", 200, 0.01);
        metrics.record_request("GET", "/metrics", 503, 0.01);
        metrics.record_request("GET", "/metrics", 500, 0.01);
        metrics.record_request("GET", "unmatched", 404, 0.001);

        let families = metrics.registry().gather();
        let errors = families
            .iter()
            .find(|f| f.get_name() == "http_requests_errors_total")
            .expect("error counter not found");
        assert_eq!(errors.get_metric().len(), 1);
        let labels: Vec<(&str, &str)> = errors.get_metric()[0]
            .get_label()
            .iter()
            .map(|p| (p.get_name(), p.get_value()))
            .collect();
        assert_eq!(labels, vec![("endpoint", "/metrics"), ("method", "GET")]);
        assert_eq!(errors.get_metric()[0].get_counter().get_value(), 2.0);
    }

    #[test]
    fn custom_buckets_are_used() {
        let backend = MemoryBackend::new();
        let collector = Arc::new(NightlyCollector::new(Arc::new(backend)).unwrap());
        let config = MetricsConfig {
            http_buckets: Some(vec![0.5, 5.0]),
        };
        let metrics = Metrics::new(collector, &config).unwrap();
        metrics.record_request("GET", "/health", 200, 1.0);

        let families = metrics.registry().gather();
        let histogram = families
            .iter()
            .find(|f| f.get_name() == "http_request_duration_seconds")
            .unwrap()
            .get_metric()[0]
            .get_histogram();
        assert_eq!(histogram.get_bucket().len(), 2);
    }

    #[tokio::test]
    async fn render_without_snapshot_advertises_nightly_metrics() {
        let (metrics, _) = metrics();

        let text = metrics.render().await.unwrap();
        assert!(text.contains("# TYPE nightly_run_id gauge"));
        assert!(text.contains("# TYPE nightly_test_status gauge"));
        assert!(!text.contains("\nnightly_run_id "));
    }

    #[tokio::test]
    async fn render_with_snapshot_includes_samples() {
        let (metrics, backend) = metrics();
        backend.set_snapshot(Some(Snapshot {
            run_id: 42,
            start: Utc::now(),
            finish: None,
            build_keys: vec!["name".to_string(), "status".to_string()],
            build_statuses: vec![vec!["build-a".into(), "OK".into()]],
            test_keys: vec!["name".to_string()],
            test_statuses: vec![],
            last_test_success: Default::default(),
        }));

        let text = metrics.render().await.unwrap();
        assert!(text.contains("nightly_run_id 42"));
        assert!(text.contains("nightly_finish_timestamp NaN"));
        assert!(text.contains(r#"nightly_build_status{name="build-a",status="OK"} 1"#));
    }

    #[tokio::test]
    async fn render_fails_when_backend_fails() {
        let (metrics, backend) = metrics();
        backend.set_failure(Some("connection reset"));

        let err = metrics.render().await.unwrap_err();
        assert_eq!(err.kind(), "query");
    }
}

//! Metrics collection and exposition for Prometheus.
//!
//! [`NightlyCollector`] turns backend snapshots into the `nightly_*` metrics on every
//! scrape; [`Metrics`] owns the registry for the exporter's own HTTP metrics and
//! renders both in the text exposition format.

mod collector;
mod exposition;
mod recorder;
mod status;

pub use collector::{
    NightlyCollector, BUILD_STATUS, FINISH_TIMESTAMP, LAST_TEST_SUCCESS, RUN_ID,
    START_TIMESTAMP, TEST_STATUS,
};
pub use exposition::{encode, TEXT_CONTENT_TYPE};
pub use recorder::{Metrics, MetricsRecorder, ScrapeError};
pub use status::{set_status, Sample, StatusMetric};

//! Translation of backend snapshots into the `nightly_*` metrics.

use std::sync::{Arc, Mutex, PoisonError};

use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, GaugeVec, Opts};
use tracing::debug;

use super::status::{describe_family, StatusMetric};
use crate::backend::snapshot::epoch_seconds;
use crate::backend::{Backend, BackendError, Snapshot};

pub const RUN_ID: &str = "nightly_run_id";
pub const START_TIMESTAMP: &str = "nightly_start_timestamp";
pub const FINISH_TIMESTAMP: &str = "nightly_finish_timestamp";
pub const BUILD_STATUS: &str = "nightly_build_status";
pub const TEST_STATUS: &str = "nightly_test_status";
pub const LAST_TEST_SUCCESS: &str = "nightly_last_test_success_timestamp";

/// Exposes the latest nightly run, re-read from the backend on every scrape.
///
/// All metric objects are created once and live as long as the collector; only their
/// contents change between scrapes.
pub struct NightlyCollector {
    backend: Arc<dyn Backend>,
    run_id: Gauge,
    start: Gauge,
    finish: Gauge,
    build_status: StatusMetric,
    test_status: StatusMetric,
    last_test_success: GaugeVec,
    // Held while populating and reading back, so concurrent scrapes never mix samples.
    scrape: Mutex<()>,
}

impl NightlyCollector {
    pub fn new(backend: Arc<dyn Backend>) -> prometheus::Result<Self> {
        Ok(Self {
            backend,
            run_id: Gauge::with_opts(Opts::new(RUN_ID, "Run id of the last nightly run"))?,
            start: Gauge::with_opts(Opts::new(
                START_TIMESTAMP,
                "Timestamp of when the last nightly run was scheduled",
            ))?,
            finish: Gauge::with_opts(Opts::new(
                FINISH_TIMESTAMP,
                "Timestamp of when the last nightly run finished or NaN if still running.",
            ))?,
            build_status: StatusMetric::new(
                BUILD_STATUS,
                "States of builds in the latest nightly run",
            )?,
            test_status: StatusMetric::new(
                TEST_STATUS,
                "States of tests in the latest nightly run",
            )?,
            last_test_success: GaugeVec::new(
                Opts::new(
                    LAST_TEST_SUCCESS,
                    "Timestamp of the last time given test was successful.  If test is \
                     currently failing this is timestamp the first time it failed; \
                     otherwise it is current timestamp.  Cancelled tests are treated as \
                     failures.",
                ),
                &["name"],
            )?,
            scrape: Mutex::new(()),
        })
    }

    /// Owned metrics in exposition order.
    fn all(&self) -> [&dyn Collector; 6] {
        [
            &self.run_id,
            &self.start,
            &self.finish,
            &self.build_status,
            &self.test_status,
            &self.last_test_success,
        ]
    }

    /// Descriptions of every owned metric, without samples and without touching the
    /// backend.
    pub fn describe(&self) -> Vec<MetricFamily> {
        self.all()
            .into_iter()
            .flat_map(|metric| metric.desc())
            .map(describe_family)
            .collect()
    }

    /// Fetches the latest snapshot and returns the populated metric families.
    ///
    /// The backend connection is dropped before populating. Without a snapshot only
    /// the descriptions are returned; fetch errors are passed through untouched.
    pub async fn collect(&self) -> Result<Vec<MetricFamily>, BackendError> {
        let snapshot = {
            let mut connection = self.backend.connect().await?;
            connection.get_metrics().await?
        };

        if snapshot.is_none() {
            debug!(
                backend = self.backend.get_name(),
                "No nightly run available, serving descriptions only"
            );
        }
        Ok(self.refresh(snapshot.as_ref()))
    }

    /// Populates every metric from `snapshot` and reads them back as one unit.
    pub fn refresh(&self, snapshot: Option<&Snapshot>) -> Vec<MetricFamily> {
        let Some(snapshot) = snapshot else {
            return self.describe();
        };

        let _guard = self.scrape.lock().unwrap_or_else(PoisonError::into_inner);
        self.populate(snapshot);
        self.all()
            .into_iter()
            .flat_map(|metric| metric.collect())
            .collect()
    }

    fn populate(&self, snapshot: &Snapshot) {
        self.run_id.set(snapshot.run_id as f64);
        self.start.set(epoch_seconds(&snapshot.start));
        self.finish
            .set(snapshot.finish.as_ref().map_or(f64::NAN, epoch_seconds));
        self.build_status
            .set(&snapshot.build_statuses, &snapshot.build_keys);
        self.test_status
            .set(&snapshot.test_statuses, &snapshot.test_keys);

        self.last_test_success.reset();
        for (name, timestamp) in &snapshot.last_test_success {
            self.last_test_success
                .with_label_values(&[name.as_str()])
                .set(epoch_seconds(timestamp));
        }

        debug!(
            run_id = snapshot.run_id,
            builds = snapshot.build_statuses.len(),
            tests = snapshot.test_statuses.len(),
            in_progress = snapshot.in_progress(),
            "Populated nightly metrics"
        );
    }
}

//! Metrics whose label sets are only known at population time.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::GaugeVec;
use serde_json::Value;

use crate::utils::value::value_to_label;

/// One row of a status table, as label name/value pairs in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub labels: Vec<(String, String)>,
}

impl Sample {
    /// Looks up a label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn to_metric(&self) -> Metric {
        let mut metric = Metric::default();
        for (name, value) in &self.labels {
            let mut pair = LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.clone());
            metric.mut_label().push(pair);
        }
        let mut gauge = proto::Gauge::default();
        gauge.set_value(1.0);
        metric.set_gauge(gauge);
        metric
    }
}

/// A gauge exposing one sample per row of a status table, each with value 1.
///
/// Unlike a `GaugeVec`, neither the label names nor the number of rows are fixed at
/// declaration: every [`set`](StatusMetric::set) replaces the whole sample set with
/// the rows it is given. Samples are emitted in row order.
pub struct StatusMetric {
    desc: Desc,
    samples: RwLock<Vec<Sample>>,
}

impl StatusMetric {
    pub fn new(name: &str, help: &str) -> prometheus::Result<Self> {
        let desc = Desc::new(name.to_string(), help.to_string(), Vec::new(), HashMap::new())?;
        Ok(Self {
            desc,
            samples: RwLock::new(Vec::new()),
        })
    }

    /// The metric's name, help and type without any samples.
    pub fn describe(&self) -> MetricFamily {
        describe_family(&self.desc)
    }

    /// Replaces all samples with one per row, labelled by zipping `keys` with the row.
    ///
    /// Every row must have exactly as many values as there are keys. A mismatch is a
    /// bug in the caller and trips a debug assertion.
    pub fn set<K: AsRef<str>>(&self, rows: &[Vec<Value>], keys: &[K]) {
        let samples = rows
            .iter()
            .map(|row| {
                debug_assert_eq!(
                    row.len(),
                    keys.len(),
                    "status row {:?} does not line up with keys",
                    row
                );
                Sample {
                    labels: keys
                        .iter()
                        .zip(row)
                        .map(|(key, value)| (key.as_ref().to_string(), value_to_label(value)))
                        .collect(),
                }
            })
            .collect();

        *self.samples.write().unwrap_or_else(PoisonError::into_inner) = samples;
    }

    /// A copy of the current sample set.
    pub fn samples(&self) -> Vec<Sample> {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Collector for StatusMetric {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut family = self.describe();
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        for sample in samples.iter() {
            family.mut_metric().push(sample.to_metric());
        }
        vec![family]
    }
}

/// A sample-less gauge family for `desc`, used to advertise a metric with no data.
pub(crate) fn describe_family(desc: &Desc) -> MetricFamily {
    let mut family = MetricFamily::default();
    family.set_name(desc.fq_name.clone());
    family.set_help(desc.help.clone());
    family.set_field_type(MetricType::GAUGE);
    family
}

/// Clears every label combination of `gauge`, then sets each of `statuses` to 1.
///
/// Suits enum-like state where each entity has exactly one active combination:
/// entities missing from `statuses` disappear instead of keeping a stale value.
pub fn set_status<S: AsRef<str>>(gauge: &GaugeVec, statuses: &[Vec<S>]) -> prometheus::Result<()> {
    gauge.reset();
    for labels in statuses {
        let values: Vec<&str> = labels.iter().map(AsRef::as_ref).collect();
        gauge.get_metric_with_label_values(&values)?.set(1.0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Opts;
    use serde_json::json;

    fn label_map(metric: &Metric) -> Vec<(String, String)> {
        metric
            .get_label()
            .iter()
            .map(|pair| (pair.get_name().to_string(), pair.get_value().to_string()))
            .collect()
    }

    #[test]
    fn describe_has_no_samples() {
        let metric = StatusMetric::new("nightly_test_status", "States of tests").unwrap();
        let family = metric.describe();

        assert_eq!(family.get_name(), "nightly_test_status");
        assert_eq!(family.get_help(), "States of tests");
        assert_eq!(family.get_field_type(), MetricType::GAUGE);
        assert!(family.get_metric().is_empty());
    }

    #[test]
    fn collect_before_set_is_empty() {
        let metric = StatusMetric::new("nightly_build_status", "States of builds").unwrap();
        let families = metric.collect();

        assert_eq!(families.len(), 1);
        assert!(families[0].get_metric().is_empty());
    }

    #[test]
    fn set_emits_one_sample_per_row_in_order() {
        let metric = StatusMetric::new("nightly_build_status", "States of builds").unwrap();
        let rows = vec![
            vec![json!("build-b"), json!("FAILED"), json!(7)],
            vec![json!("build-a"), json!("OK"), json!(3)],
        ];
        metric.set(&rows, &["name", "status", "id"]);

        let families = metric.collect();
        let samples = families[0].get_metric();
        assert_eq!(samples.len(), 2);
        assert_eq!(
            label_map(&samples[0]),
            vec![
                ("name".to_string(), "build-b".to_string()),
                ("status".to_string(), "FAILED".to_string()),
                ("id".to_string(), "7".to_string()),
            ]
        );
        assert_eq!(samples[1].get_label()[0].get_value(), "build-a");
        assert!(samples.iter().all(|m| m.get_gauge().get_value() == 1.0));
    }

    #[test]
    fn set_replaces_instead_of_accumulating() {
        let metric = StatusMetric::new("nightly_test_status", "States of tests").unwrap();
        metric.set(
            &[vec![json!("t1")], vec![json!("t2")], vec![json!("t3")]],
            &["name"],
        );
        metric.set(&[vec![json!("t4")]], &["name"]);

        let samples = metric.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].label("name"), Some("t4"));
    }

    #[test]
    fn set_with_no_rows_clears_samples() {
        let metric = StatusMetric::new("nightly_test_status", "States of tests").unwrap();
        metric.set(&[vec![json!("t1")]], &["name"]);
        metric.set::<&str>(&[], &["name"]);

        assert!(metric.samples().is_empty());
    }

    #[test]
    #[should_panic(expected = "does not line up with keys")]
    #[cfg(debug_assertions)]
    fn mismatched_row_fails_loudly() {
        let metric = StatusMetric::new("nightly_test_status", "States of tests").unwrap();
        metric.set(&[vec![json!("t1"), json!("extra")]], &["name"]);
    }

    #[test]
    fn set_status_drops_vanished_combinations() {
        let gauge = GaugeVec::new(Opts::new("build_state", "Build state"), &["name", "state"])
            .unwrap();

        set_status(&gauge, &[vec!["a", "OK"], vec!["b", "FAILED"]]).unwrap();
        set_status(&gauge, &[vec!["a", "FAILED"]]).unwrap();

        let families = gauge.collect();
        let metrics = families[0].get_metric();
        assert_eq!(metrics.len(), 1);
        assert_eq!(
            label_map(&metrics[0]),
            vec![
                ("name".to_string(), "a".to_string()),
                ("state".to_string(), "FAILED".to_string()),
            ]
        );
        assert_eq!(metrics[0].get_gauge().get_value(), 1.0);
    }

    #[test]
    fn set_status_rejects_wrong_cardinality() {
        let gauge = GaugeVec::new(Opts::new("build_state", "Build state"), &["name", "state"])
            .unwrap();
        assert!(set_status(&gauge, &[vec!["only-name"]]).is_err());
    }
}

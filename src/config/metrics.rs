use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings for the exporter's own HTTP request metrics.
#[derive(Deserialize, Serialize, Debug, Default, JsonSchema)]
pub struct MetricsConfig {
    /// Latency histogram buckets in seconds; the prometheus defaults when omitted.
    #[serde(default)]
    pub http_buckets: Option<Vec<f64>>,
}

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::Bson;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The state of the latest nightly run as reported by the backend.
///
/// A snapshot is fetched fresh for every scrape and never cached. Status rows are
/// positional: `build_statuses[i][j]` is the value of `build_keys[j]` for build `i`,
/// and likewise for tests.
///
/// Timestamps are written as RFC 3339 strings but also read from native BSON dates, so
/// documents inserted by other MongoDB clients decode as well.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub run_id: i64,
    #[serde(deserialize_with = "timestamp")]
    pub start: DateTime<Utc>,
    /// Absent while the run is still in progress.
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub finish: Option<DateTime<Utc>>,
    pub build_keys: Vec<String>,
    #[serde(default)]
    pub build_statuses: Vec<Vec<Value>>,
    pub test_keys: Vec<String>,
    #[serde(default)]
    pub test_statuses: Vec<Vec<Value>>,
    /// Test name -> last time it passed, or the time it first started failing.
    #[serde(default, deserialize_with = "timestamp_map")]
    pub last_test_success: BTreeMap<String, DateTime<Utc>>,
}

impl Snapshot {
    /// Whether the run has not finished yet.
    pub fn in_progress(&self) -> bool {
        self.finish.is_none()
    }
}

/// Seconds since the Unix epoch, keeping sub-second precision.
pub fn epoch_seconds(timestamp: &DateTime<Utc>) -> f64 {
    timestamp.timestamp_micros() as f64 / 1_000_000.0
}

fn bson_to_datetime(value: Bson) -> Result<DateTime<Utc>, String> {
    match value {
        Bson::DateTime(date) => Utc
            .timestamp_millis_opt(date.timestamp_millis())
            .single()
            .ok_or_else(|| format!("timestamp {} is out of range", date)),
        Bson::String(text) => DateTime::parse_from_rfc3339(&text)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|e| format!("invalid timestamp '{}': {}", text, e)),
        other => Err(format!(
            "expected a timestamp, found {:?}",
            other.element_type()
        )),
    }
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    bson_to_datetime(Bson::deserialize(deserializer)?).map_err(D::Error::custom)
}

fn optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<Bson>::deserialize(deserializer)? {
        None | Some(Bson::Null) => Ok(None),
        Some(value) => bson_to_datetime(value).map(Some).map_err(D::Error::custom),
    }
}

fn timestamp_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, DateTime<Utc>>, D::Error> {
    BTreeMap::<String, Bson>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, value)| Ok((name, bson_to_datetime(value).map_err(D::Error::custom)?)))
        .collect()
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::backend::file_backend::FileBackendConfig;
use crate::backend::mongodb_backend::MongoDBConfig;

/// A wrapper for the backend configuration:
/// - enabled: if false, no snapshot is ever available (NoBackend).
/// - kind: the actual snapshot source (MongoDB, file).
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct BackendConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: Option<BackendKind>,
}

/// The existing backends. We differentiate them via a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
#[serde(tag = "type")]
pub enum BackendKind {
    #[serde(rename = "mongo")]
    MongoDB(MongoDBConfig),
    #[serde(rename = "file")]
    File(FileBackendConfig),
}

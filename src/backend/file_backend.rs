use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::{Backend, BackendError, Connection, Snapshot};

/// The config struct for the file backend.
/// The file holds a single snapshot serialized as JSON, rewritten by whatever
/// process tracks the nightly runs.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct FileBackendConfig {
    pub path: PathBuf,
}

/// A `Backend` that reads the snapshot from a JSON file on every scrape.
///
/// A missing or empty file means no nightly run has been recorded yet.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(config: &FileBackendConfig) -> Self {
        Self {
            path: config.path.clone(),
        }
    }
}

struct FileConnection {
    file: Option<File>,
}

#[async_trait]
impl Backend for FileBackend {
    async fn connect(&self) -> Result<Box<dyn Connection>, BackendError> {
        let file = match File::open(&self.path).await {
            Ok(file) => Some(file),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Snapshot file does not exist yet");
                None
            }
            Err(e) => {
                return Err(BackendError::Connect(format!(
                    "Failed to open {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        Ok(Box::new(FileConnection { file }))
    }

    fn get_name(&self) -> &str {
        "file"
    }
}

#[async_trait]
impl Connection for FileConnection {
    async fn get_metrics(&mut self) -> Result<Option<Snapshot>, BackendError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        if contents.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

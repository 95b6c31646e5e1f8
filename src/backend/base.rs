use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use super::{
    file_backend::FileBackend, mongodb_backend::MongoBackend, no_backend::NoBackend, Snapshot,
};
use crate::config::{BackendConfig, BackendKind};

/// Failures while talking to the backend. Any of these fails the scrape.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to connect to backend: {0}")]
    Connect(String),
    #[error("backend query failed: {0}")]
    Query(String),
    #[error("malformed snapshot: {0}")]
    Decode(String),
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Short, stable identifier used for log keys.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Connect(_) => "connect",
            BackendError::Query(_) => "query",
            BackendError::Decode(_) => "decode",
            BackendError::Io(_) => "io",
        }
    }
}

/// The Backend trait abstracts where nightly snapshots come from.
///
/// A backend hands out one [`Connection`] per scrape. The connection is released when
/// it is dropped, so callers should keep it scoped to a single fetch.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>, BackendError>;
    fn get_name(&self) -> &str;
}

/// A live handle on the backend, valid for one scrape.
#[async_trait]
pub trait Connection: Send {
    /// Returns the latest snapshot, or `None` if no nightly run exists yet.
    async fn get_metrics(&mut self) -> Result<Option<Snapshot>, BackendError>;
}

/// Creates a concrete backend implementation based on the BackendConfig.
/// If `backend.enabled = false`, returns NoBackend. Otherwise, picks the specified kind.
pub async fn create_backend(config: &BackendConfig) -> Arc<dyn Backend> {
    if !config.enabled {
        info!("Backend is disabled. Using NoBackend, scrapes will carry descriptions only.");
        return Arc::new(NoBackend::new());
    }

    match &config.kind {
        Some(BackendKind::MongoDB(mongo_config)) => match MongoBackend::new(mongo_config).await {
            Ok(backend) => {
                info!("Successfully created MongoDB backend.");
                Arc::new(backend)
            }
            Err(e) => {
                error!("Failed to create MongoDB backend: {}", e);
                std::process::exit(1);
            }
        },
        Some(BackendKind::File(file_config)) => {
            info!(path = %file_config.path.display(), "Using file backend.");
            Arc::new(FileBackend::new(file_config))
        }
        None => {
            error!("Backend is enabled, but no backend config is provided!");
            std::process::exit(1);
        }
    }
}

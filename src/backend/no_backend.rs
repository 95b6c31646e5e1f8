use async_trait::async_trait;

use super::{Backend, BackendError, Connection, Snapshot};

/// A backend that never has data, used when the backend is disabled.
/// Scrapes against it only advertise the metric descriptions.
pub struct NoBackend;

impl NoBackend {
    pub fn new() -> Self {
        NoBackend
    }
}

impl Default for NoBackend {
    fn default() -> Self {
        Self::new()
    }
}

struct NoConnection;

#[async_trait]
impl Backend for NoBackend {
    async fn connect(&self) -> Result<Box<dyn Connection>, BackendError> {
        Ok(Box::new(NoConnection))
    }

    fn get_name(&self) -> &str {
        "none"
    }
}

#[async_trait]
impl Connection for NoConnection {
    async fn get_metrics(&mut self) -> Result<Option<Snapshot>, BackendError> {
        Ok(None)
    }
}

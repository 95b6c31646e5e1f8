use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{Backend, BackendError, Connection, Snapshot};

/// An in-process backend whose snapshot is swapped in by the caller.
///
/// Useful for embedding the exporter next to a scheduler that already holds the run
/// state in memory, and for tests. It also counts open connections so callers can
/// check that every scrape releases its connection.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    snapshot: Mutex<Option<Snapshot>>,
    failure: Mutex<Option<String>>,
    open_connections: Mutex<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot served to subsequent scrapes.
    pub fn set_snapshot(&self, snapshot: Option<Snapshot>) {
        *lock(&self.inner.snapshot) = snapshot;
    }

    /// Makes every following fetch fail with a query error until cleared.
    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.inner.failure) = message.map(str::to_string);
    }

    pub fn open_connections(&self) -> usize {
        *lock(&self.inner.open_connections)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct MemoryConnection {
    state: Arc<MemoryState>,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        *lock(&self.state.open_connections) -= 1;
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn connect(&self) -> Result<Box<dyn Connection>, BackendError> {
        *lock(&self.inner.open_connections) += 1;
        Ok(Box::new(MemoryConnection {
            state: self.inner.clone(),
        }))
    }

    fn get_name(&self) -> &str {
        "memory"
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn get_metrics(&mut self) -> Result<Option<Snapshot>, BackendError> {
        if let Some(message) = lock(&self.state.failure).clone() {
            return Err(BackendError::Query(message));
        }
        Ok(lock(&self.state.snapshot).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(run_id: i64) -> Snapshot {
        Snapshot {
            run_id,
            start: Utc::now(),
            finish: None,
            build_keys: vec![],
            build_statuses: vec![],
            test_keys: vec![],
            test_statuses: vec![],
            last_test_success: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_connection_is_released_on_drop() {
        let backend = MemoryBackend::new();
        backend.set_snapshot(Some(snapshot(3)));
        {
            let mut connection = backend.connect().await.unwrap();
            assert_eq!(backend.open_connections(), 1);
            let fetched = connection.get_metrics().await.unwrap();
            assert_eq!(fetched.map(|s| s.run_id), Some(3));
        }
        assert_eq!(backend.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_reported_as_query_error() {
        let backend = MemoryBackend::new();
        backend.set_failure(Some("database is down"));
        let mut connection = backend.connect().await.unwrap();
        let err = connection.get_metrics().await.unwrap_err();
        assert_eq!(err.kind(), "query");
    }
}

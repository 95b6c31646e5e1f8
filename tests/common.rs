use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use nightly_exporter::backend::memory_backend::MemoryBackend;
use nightly_exporter::backend::{Backend, Snapshot};
use nightly_exporter::config::{extract_config, ConfigV1};
use nightly_exporter::routes::create_router;
use nightly_exporter::startup::build_state;
use serde_json::json;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:9090
logging:
  level: "debug"
  format: "json"
backend:
  enabled: true
  type: file
  path: /nonexistent/snapshot.json
"#;

pub fn load_test_config() -> ConfigV1 {
    extract_config(&Figment::new().merge(Yaml::string(TEST_CONFIG)))
        .expect("Failed to parse test config YAML")
}

/// The router wired to `backend` instead of the configured one.
pub fn build_app(backend: Arc<dyn Backend>) -> Router {
    let state = build_state(&load_test_config(), backend).expect("metrics should register");
    create_router(state)
}

pub fn memory_app() -> (Router, MemoryBackend) {
    let backend = MemoryBackend::new();
    (build_app(Arc::new(backend.clone())), backend)
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Run 42 from the scenario: still running, one build, no tests.
pub fn running_snapshot() -> Snapshot {
    Snapshot {
        run_id: 42,
        start: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        finish: None,
        build_keys: vec!["name".to_string(), "status".to_string()],
        build_statuses: vec![vec![json!("build-a"), json!("OK")]],
        test_keys: vec!["name".to_string()],
        test_statuses: vec![],
        last_test_success: Default::default(),
    }
}

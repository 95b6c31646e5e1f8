use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::backend::BackendError;
use crate::metrics::ScrapeError;

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Converts our `HTTPError` into a JSON error response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// An unreachable backend is a 503 so the scraper marks the target as down;
/// anything else is our own failure.
impl From<&ScrapeError> for HTTPError {
    fn from(err: &ScrapeError) -> Self {
        let status = match err {
            ScrapeError::Backend(BackendError::Connect(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        HTTPError::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_failures_are_service_unavailable() {
        let err = ScrapeError::Backend(BackendError::Connect("refused".into()));
        assert_eq!(HTTPError::from(&err).status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn query_failures_are_internal_errors() {
        let err = ScrapeError::Backend(BackendError::Query("timeout".into()));
        assert_eq!(HTTPError::from(&err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn read_failures_are_internal_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "is a directory");
        let err = ScrapeError::Backend(BackendError::from(io));
        assert_eq!(err.kind(), "io");
        assert_eq!(HTTPError::from(&err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

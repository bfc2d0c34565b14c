use std::time::Duration;

use brag_core::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Error reported inside a successful response body
    #[error("API error: {0}")]
    Api(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LLMError>;

impl From<LLMError> for BackendError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Http(e) => BackendError::Transport(e.to_string()),
            LLMError::Middleware(e) => BackendError::Transport(e.to_string()),
            LLMError::Status { status, body } => BackendError::Status { status, body },
            LLMError::EmptyResponse => BackendError::EmptyResponse,
            LLMError::Timeout(after) => BackendError::Timeout(after),
            other => BackendError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_backend_status() {
        let err: BackendError = LLMError::Status {
            status: 503,
            body: "busy".to_string(),
        }
        .into();

        assert!(matches!(err, BackendError::Status { status: 503, .. }));
    }

    #[test]
    fn empty_and_timeout_keep_their_kind() {
        let empty: BackendError = LLMError::EmptyResponse.into();
        assert!(matches!(empty, BackendError::EmptyResponse));

        let timeout: BackendError = LLMError::Timeout(Duration::from_secs(900)).into();
        match timeout {
            BackendError::Timeout(after) => assert_eq!(after, Duration::from_secs(900)),
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn api_errors_become_other() {
        let err: BackendError = LLMError::Api("model not found".to_string()).into();
        match err {
            BackendError::Other(msg) => assert!(msg.contains("model not found")),
            other => panic!("expected Other, got {other:?}"),
        }
    }
}

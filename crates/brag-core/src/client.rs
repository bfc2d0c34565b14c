//! The language-model capability the merger consumes.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a summarization backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or transport failure before a response was read.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered but produced no text.
    #[error("Backend returned an empty response")]
    EmptyResponse,

    /// The call exceeded the adapter's timeout.
    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// Generates text for a prompt.
///
/// Transport, authentication, streaming, timeouts and retries are the
/// implementor's concern. Implementations must return an error rather than an
/// empty string when the backend produced nothing.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// # Arguments
    /// * `prompt` - Fully rendered prompt text
    /// * `model_hint` - Model name the caller would like used
    async fn generate(&self, prompt: &str, model_hint: &str) -> Result<String, BackendError>;
}

/// Arc-wrapped client for easy sharing.
pub type SharedSummarizationClient = Arc<dyn SummarizationClient>;

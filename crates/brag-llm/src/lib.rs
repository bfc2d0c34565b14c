//! HTTP summarization backends for `brag-core`.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod provider_factory;
pub mod providers;

pub use config::Config;
pub use error::{LLMError, Result};
pub use http::{build_http_client, build_retry_client, DEFAULT_MAX_RETRIES};
pub use models::{profile_for, ModelProfile, DEFAULT_MODEL, SUPPORTED_MODELS};
pub use provider_factory::{create_client, validate_provider_config, AVAILABLE_PROVIDERS};
pub use providers::{LiteLlmClient, OllamaClient};

//! Provider Factory
//!
//! Creates summarization clients based on configuration.

use std::sync::Arc;
use std::time::Duration;

use brag_core::SharedSummarizationClient;

use crate::config::Config;
use crate::error::{LLMError, Result};
use crate::http::default_client;
use crate::models::{is_supported, DEFAULT_MODEL, SUPPORTED_MODELS};
use crate::providers::{LiteLlmClient, OllamaClient};

/// Available provider types
pub const AVAILABLE_PROVIDERS: &[&str] = &["ollama", "litellm"];

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Model the client falls back to when a call carries no hint.
fn default_model(config: &Config) -> &str {
    non_empty(&config.model).unwrap_or(config.pipeline.model.as_str())
}

/// Create a client based on the given configuration
pub fn create_client(config: &Config) -> Result<SharedSummarizationClient> {
    validate_provider_config(config)?;
    for model in unsupported_models(config) {
        let known: Vec<&str> = SUPPORTED_MODELS.iter().map(|(name, _)| *name).collect();
        log::warn!(
            "Model '{}' is not one of [{}]; using '{}' generation settings",
            model,
            known.join(", "),
            DEFAULT_MODEL
        );
    }

    let http = default_client(config.max_retries)?;
    let timeout = config.timeout_secs.map(Duration::from_secs);

    match config.provider.as_str() {
        "ollama" => {
            let mut client = OllamaClient::with_client(http).with_model(default_model(config));
            if let Some(base_url) = non_empty(&config.base_url) {
                client = client.with_base_url(base_url);
            }
            if let Some(timeout) = timeout {
                client = client.with_timeout(timeout);
            }
            log::info!("Using Ollama provider");
            Ok(Arc::new(client))
        }

        "litellm" => {
            let mut client = LiteLlmClient::with_client(http).with_model(default_model(config));
            if let Some(base_url) = non_empty(&config.base_url) {
                client = client.with_base_url(base_url);
            }
            if let Some(api_key) = non_empty(&config.api_key) {
                client = client.with_api_key(api_key);
            }
            if let Some(timeout) = timeout {
                client = client.with_timeout(timeout);
            }
            log::info!("Using LiteLLM provider");
            Ok(Arc::new(client))
        }

        other => Err(unknown_provider(other)),
    }
}

/// Configured models without a dedicated profile.
fn unsupported_models(config: &Config) -> Vec<&str> {
    let mut models = vec![default_model(config)];
    if config.pipeline.model != models[0] {
        models.push(config.pipeline.model.as_str());
    }
    models.retain(|model| !is_supported(model));
    models
}

fn unknown_provider(name: &str) -> LLMError {
    LLMError::Config(format!(
        "Unknown provider: {}. Available: {}",
        name,
        AVAILABLE_PROVIDERS.join(", ")
    ))
}

/// Validate provider configuration without creating the client
pub fn validate_provider_config(config: &Config) -> Result<()> {
    if !AVAILABLE_PROVIDERS.contains(&config.provider.as_str()) {
        return Err(unknown_provider(&config.provider));
    }

    if let Some(base_url) = non_empty(&config.base_url) {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LLMError::Config(format!(
                "base_url must start with http:// or https://, got {}",
                base_url
            )));
        }
    }

    if config.timeout_secs == Some(0) {
        return Err(LLMError::Config("timeout_secs must be positive".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_providers() {
        assert!(AVAILABLE_PROVIDERS.contains(&"ollama"));
        assert!(AVAILABLE_PROVIDERS.contains(&"litellm"));
        assert_eq!(AVAILABLE_PROVIDERS.len(), 2);
    }

    #[test]
    fn test_create_default_client() {
        assert!(create_client(&Config::default()).is_ok());
    }

    #[test]
    fn test_create_litellm_client() {
        let config = Config {
            provider: "litellm".to_string(),
            api_key: Some("sk-test".to_string()),
            base_url: Some("https://llm.internal:4000".to_string()),
            ..Config::default()
        };
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_unknown_provider_lists_available() {
        let config = Config {
            provider: "gemini".to_string(),
            ..Config::default()
        };

        match create_client(&config) {
            Err(LLMError::Config(msg)) => {
                assert!(msg.contains("gemini"));
                assert!(msg.contains("ollama, litellm"));
            }
            Err(other) => panic!("expected config error, got {other:?}"),
            Ok(_) => panic!("expected config error"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_base_url_and_zero_timeout() {
        let config = Config {
            base_url: Some("localhost:11434".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            validate_provider_config(&config),
            Err(LLMError::Config(_))
        ));

        let config = Config {
            timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(matches!(
            validate_provider_config(&config),
            Err(LLMError::Config(_))
        ));
    }

    #[test]
    fn test_unsupported_model_still_creates_client() {
        let mut config = Config::default();
        config.model = Some("mixtral".to_string());
        config.pipeline.model = "phi3".to_string();

        assert_eq!(unsupported_models(&config), vec!["mixtral", "phi3"]);
        assert!(create_client(&config).is_ok());

        config.model = Some("llama2".to_string());
        config.pipeline.model = "mistral".to_string();
        assert!(unsupported_models(&config).is_empty());
    }

    #[test]
    fn test_config_model_overrides_pipeline_model() {
        let mut config = Config::default();
        assert_eq!(default_model(&config), "mistral");

        config.model = Some("llama2".to_string());
        assert_eq!(default_model(&config), "llama2");
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brag_core::{BackendError, SummarizationClient};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::error::{LLMError, Result};
use crate::http::{default_client, DEFAULT_MAX_RETRIES};
use crate::models::{profile_for, ModelProfile, DEFAULT_MODEL};

pub const DEFAULT_LITELLM_URL: &str = "http://localhost:11434";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Client for a LiteLLM proxy exposing `/api/generate`, non-streaming.
pub struct LiteLlmClient {
    client: Arc<ClientWithMiddleware>,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Option<Duration>,
}

impl LiteLlmClient {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(default_client(DEFAULT_MAX_RETRIES)?))
    }

    pub fn with_client(client: ClientWithMiddleware) -> Self {
        Self {
            client: Arc::new(client),
            api_key: None,
            base_url: DEFAULT_LITELLM_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn generate_text(&self, prompt: &str, model: Option<&str>) -> Result<String> {
        let model_to_use = model
            .filter(|m| !m.is_empty())
            .unwrap_or(self.model.as_str());
        let profile = profile_for(model_to_use);
        let timeout = self.timeout.unwrap_or(profile.timeout);

        log::info!("Sending request to LiteLLM with model {}", model_to_use);

        let text = tokio::time::timeout(timeout, self.send(model_to_use, prompt, &profile))
            .await
            .map_err(|_| LLMError::Timeout(timeout))??;

        if text.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }
        Ok(text)
    }

    async fn send(&self, model: &str, prompt: &str, profile: &ModelProfile) -> Result<String> {
        let mut request = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&build_litellm_body(model, prompt, profile));

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await?;
        let status = response.status();
        log::debug!("LiteLLM response status: {}", status);

        if !status.is_success() {
            let body = response.text().await?;
            return Err(LLMError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&response.text().await?)?;
        parsed.response.ok_or(LLMError::EmptyResponse)
    }
}

#[async_trait]
impl SummarizationClient for LiteLlmClient {
    async fn generate(&self, prompt: &str, model_hint: &str) -> std::result::Result<String, BackendError> {
        self.generate_text(prompt, Some(model_hint))
            .await
            .map_err(BackendError::from)
    }
}

pub(crate) fn build_litellm_body(model: &str, prompt: &str, profile: &ModelProfile) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "prompt": prompt,
        "stream": false,
        "options": {
            "temperature": profile.temperature,
            "top_p": profile.top_p,
            "max_tokens": profile.max_output_tokens,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_retry_client;

    fn client() -> LiteLlmClient {
        LiteLlmClient::with_client(build_retry_client(reqwest::Client::new(), 0))
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let client = client().with_api_key("");
        assert!(client.api_key.is_none());

        let client = client.with_api_key("sk-local");
        assert_eq!(client.api_key.as_deref(), Some("sk-local"));
    }

    #[test]
    fn test_request_body_is_not_streamed() {
        let body = build_litellm_body("llama2", "Polish this", &profile_for("llama2"));

        assert_eq!(body["model"], "llama2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["max_tokens"], 200);
        assert!((body["options"]["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_response_without_text_field_parses() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"model":"mistral"}"#).unwrap();
        assert!(parsed.response.is_none());
    }
}

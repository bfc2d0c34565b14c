use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brag_core::{BackendError, SummarizationClient};
use futures_util::StreamExt;
use reqwest::Response;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::error::{LLMError, Result};
use crate::http::{default_client, DEFAULT_MAX_RETRIES};
use crate::models::{profile_for, ModelProfile, DEFAULT_MODEL};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// One line of Ollama's streamed `/api/generate` output.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for an Ollama-compatible `/api/generate` endpoint, streaming.
pub struct OllamaClient {
    client: Arc<ClientWithMiddleware>,
    base_url: String,
    model: String,
    timeout: Option<Duration>,
}

impl OllamaClient {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(default_client(DEFAULT_MAX_RETRIES)?))
    }

    pub fn with_client(client: ClientWithMiddleware) -> Self {
        Self {
            client: Arc::new(client),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the per-model timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Generate text for `prompt`, optionally overriding the default model.
    pub async fn generate_text(&self, prompt: &str, model: Option<&str>) -> Result<String> {
        let model_to_use = model
            .filter(|m| !m.is_empty())
            .unwrap_or(self.model.as_str());
        let profile = profile_for(model_to_use);
        let timeout = self.timeout.unwrap_or(profile.timeout);

        log::info!(
            "Using model {} with timeout of {} minutes",
            model_to_use,
            timeout.as_secs() / 60
        );

        let text = tokio::time::timeout(timeout, self.send_and_collect(model_to_use, prompt, &profile))
            .await
            .map_err(|_| LLMError::Timeout(timeout))??;

        if text.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }
        Ok(text)
    }

    async fn send_and_collect(&self, model: &str, prompt: &str, profile: &ModelProfile) -> Result<String> {
        let body = build_ollama_body(model, prompt, profile);
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(LLMError::Status { status, body });
        }

        collect_ndjson_response(response).await
    }
}

#[async_trait]
impl SummarizationClient for OllamaClient {
    async fn generate(&self, prompt: &str, model_hint: &str) -> std::result::Result<String, BackendError> {
        self.generate_text(prompt, Some(model_hint))
            .await
            .map_err(BackendError::from)
    }
}

pub(crate) fn build_ollama_body(model: &str, prompt: &str, profile: &ModelProfile) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "prompt": prompt,
        "stream": true,
        "options": {
            "num_predict": profile.max_output_tokens,
        },
    })
}

/// Apply one NDJSON line to `text`. Returns `true` once the stream is done.
///
/// Lines that do not parse are skipped.
fn apply_line(line: &[u8], text: &mut String) -> Result<bool> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(false);
    }

    let chunk: GenerateChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            log::warn!("Failed to parse streaming response line ({}): {}", e, line);
            return Ok(false);
        }
    };

    if let Some(error) = chunk.error {
        return Err(LLMError::Api(error));
    }
    if let Some(fragment) = chunk.response {
        text.push_str(&fragment);
    }
    Ok(chunk.done)
}

/// Concatenate the `response` fields of a newline-delimited JSON body.
///
/// Lines may arrive split across network chunks, so bytes are buffered until a
/// newline is seen.
pub(crate) async fn collect_ndjson_response(response: Response) -> Result<String> {
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut text = String::new();

    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);

        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            if apply_line(&line, &mut text)? {
                return Ok(text);
            }
        }
    }

    apply_line(&buffer, &mut text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_retry_client;

    fn client() -> OllamaClient {
        OllamaClient::with_client(build_retry_client(reqwest::Client::new(), 0))
    }

    #[test]
    fn test_default_values() {
        let client = client();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model, "mistral");
        assert!(client.timeout.is_none());
    }

    #[test]
    fn test_chained_builders() {
        let client = client()
            .with_base_url("http://gpu-box:11434/")
            .with_model("llama2")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(client.base_url, "http://gpu-box:11434");
        assert_eq!(client.model, "llama2");
        assert_eq!(client.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_request_body_streams_with_num_predict() {
        let body = build_ollama_body("mistral", "Summarize this", &profile_for("mistral"));

        assert_eq!(body["model"], "mistral");
        assert_eq!(body["prompt"], "Summarize this");
        assert_eq!(body["stream"], true);
        assert_eq!(body["options"]["num_predict"], 200);
    }

    #[test]
    fn test_apply_line_accumulates_fragments() {
        let mut text = String::new();

        assert!(!apply_line(br#"{"response":"Led ","done":false}"#, &mut text).unwrap());
        assert!(!apply_line(br#"{"response":"the migration","done":false}"#, &mut text).unwrap());
        assert!(apply_line(br#"{"response":"","done":true}"#, &mut text).unwrap());

        assert_eq!(text, "Led the migration");
    }

    #[test]
    fn test_apply_line_skips_garbage_and_blank_lines() {
        let mut text = String::new();

        assert!(!apply_line(b"   \n", &mut text).unwrap());
        assert!(!apply_line(b"{not json", &mut text).unwrap());
        assert!(text.is_empty());
    }

    #[test]
    fn test_apply_line_surfaces_in_band_errors() {
        let mut text = String::new();

        let result = apply_line(br#"{"error":"model 'foo' not found"}"#, &mut text);

        match result {
            Err(LLMError::Api(msg)) => assert!(msg.contains("not found")),
            other => panic!("expected LLMError::Api, got {other:?}"),
        }
    }
}

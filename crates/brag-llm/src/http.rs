//! HTTP client construction shared by the providers.

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::error::{LLMError, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub fn build_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("brag-llm/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(LLMError::Http)
}

/// Wrap `client` so transient failures (connect errors, 5xx, 408, 429) are
/// retried with exponential backoff. Zero retries disables the middleware.
pub fn build_retry_client(client: Client, max_retries: u32) -> ClientWithMiddleware {
    if max_retries == 0 {
        return ClientBuilder::new(client).build();
    }

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}

/// Plain client plus retry middleware.
pub fn default_client(max_retries: u32) -> Result<ClientWithMiddleware> {
    Ok(build_retry_client(build_http_client()?, max_retries))
}

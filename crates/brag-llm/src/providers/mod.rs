pub mod litellm;
pub mod ollama;

pub use litellm::LiteLlmClient;
pub use ollama::OllamaClient;

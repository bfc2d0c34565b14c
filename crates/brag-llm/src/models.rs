//! Per-model generation settings.

use std::time::Duration;

/// Local models are slow on commodity hardware; calls may take minutes.
pub const LOCAL_MODEL_TIMEOUT: Duration = Duration::from_secs(15 * 60);

pub const DEFAULT_MODEL: &str = "mistral";

/// Supported models and a short description of each.
pub const SUPPORTED_MODELS: &[(&str, &str)] = &[
    ("mistral", "Mistral 7B - Balanced model for general use"),
    ("llama2", "Llama 2 7B - More creative, good for varied outputs"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelProfile {
    pub temperature: f32,
    pub top_p: f32,
    /// Upper bound on generated tokens per call
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

const LOCAL_PROFILE: ModelProfile = ModelProfile {
    temperature: 0.5,
    top_p: 0.9,
    max_output_tokens: 200,
    timeout: LOCAL_MODEL_TIMEOUT,
};

/// Settings for `model`; unknown models get the `mistral` profile.
pub fn profile_for(model: &str) -> ModelProfile {
    match model {
        "mistral" | "llama2" => LOCAL_PROFILE,
        other => {
            log::debug!("No profile for model '{}', using '{}' defaults", other, DEFAULT_MODEL);
            LOCAL_PROFILE
        }
    }
}

pub fn is_supported(model: &str) -> bool {
    SUPPORTED_MODELS.iter().any(|(name, _)| *name == model)
}

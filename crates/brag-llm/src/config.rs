use std::path::{Path, PathBuf};

use brag_core::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::http::DEFAULT_MAX_RETRIES;

const CONFIG_FILE_PATH: &str = "config.toml";

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Overrides the per-model request timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

pub fn brag_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".brag")
}

pub fn config_json_path() -> PathBuf {
    brag_dir().join("config.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            api_key: None,
            model: None,
            timeout_secs: None,
            max_retries: DEFAULT_MAX_RETRIES,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load from `~/.brag/config.json`, falling back to `./config.toml`, then
    /// apply `BRAG_*` environment overrides.
    pub fn new() -> Self {
        let mut config = Self::load_from(&config_json_path())
            .or_else(|| Self::load_from(Path::new(CONFIG_FILE_PATH)))
            .unwrap_or_default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Parse a config file, JSON or TOML by extension. Unreadable or
    /// malformed files yield `None`.
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read config {}: {}", path.display(), e);
                return None;
            }
        };

        let is_toml = path.extension().and_then(|ext| ext.to_str()) == Some("toml");
        let parsed = if is_toml {
            toml::from_str::<Config>(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str::<Config>(&content).map_err(|e| e.to_string())
        };

        match parsed {
            Ok(config) => {
                log::debug!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                log::warn!("Failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }

    pub(crate) fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("BRAG_PROVIDER") {
            self.provider = provider;
        }
        if let Some(base_url) = lookup("BRAG_BASE_URL") {
            self.base_url = Some(base_url);
        }
        if let Some(api_key) = lookup("BRAG_API_KEY") {
            self.api_key = Some(api_key);
        }
        if let Some(model) = lookup("BRAG_MODEL") {
            self.pipeline.model = model.clone();
            self.model = Some(model);
        }
        if let Some(secs) = lookup("BRAG_TIMEOUT_SECS") {
            match secs.trim().parse() {
                Ok(secs) => self.timeout_secs = Some(secs),
                Err(_) => log::warn!("Ignoring invalid BRAG_TIMEOUT_SECS: {}", secs),
            }
        }
        if let Some(retries) = lookup("BRAG_MAX_RETRIES") {
            match retries.trim().parse() {
                Ok(retries) => self.max_retries = retries,
                Err(_) => log::warn!("Ignoring invalid BRAG_MAX_RETRIES: {}", retries),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_point_at_local_ollama() {
        let config = Config::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.pipeline.hard_ceiling, 7100);
    }

    #[test]
    fn load_from_json_with_partial_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"provider":"litellm","api_key":"sk-1","pipeline":{"tone":"Casual"}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.provider, "litellm");
        assert_eq!(config.api_key.as_deref(), Some("sk-1"));
        assert_eq!(config.pipeline.tone, "Casual");
        assert_eq!(config.pipeline.max_tokens_per_batch, 3000);
    }

    #[test]
    fn load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "base_url = \"http://gpu-box:11434\"\nmax_retries = 0\n\n[pipeline]\nmax_tokens_per_batch = 1500"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.base_url.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.pipeline.max_tokens_per_batch, 1500);
    }

    #[test]
    fn load_from_missing_or_malformed_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.json")).is_none());

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_none());
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BRAG_PROVIDER", "litellm"),
            ("BRAG_MODEL", "llama2"),
            ("BRAG_TIMEOUT_SECS", "30"),
            ("BRAG_MAX_RETRIES", "nope"),
        ]);
        let mut config = Config::default();

        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.provider, "litellm");
        assert_eq!(config.model.as_deref(), Some("llama2"));
        assert_eq!(config.pipeline.model, "llama2");
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.max_retries, 3);
    }
}

//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};

/// Default soft ceiling for one batch, in estimated tokens.
pub const DEFAULT_MAX_TOKENS_PER_BATCH: u32 = 3000;
/// Default hard ceiling past which a batch is split before summarizing.
pub const DEFAULT_HARD_CEILING: u32 = 7100;
/// Default number of raw items per first-pass chunk.
pub const DEFAULT_FIRST_PASS_CHUNK_SIZE: usize = 8;
/// Default round limit before giving up on convergence.
pub const DEFAULT_MAX_ROUNDS: usize = 64;

/// How batches inside one round are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Execution {
    /// One batch at a time, in order
    Sequential,
    /// Up to `max_in_flight` batches at once; results still collected in order
    Concurrent { max_in_flight: usize },
}

impl Default for Execution {
    fn default() -> Self {
        Self::Sequential
    }
}

/// Configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Soft ceiling used when grouping units into batches
    #[serde(default = "default_max_tokens_per_batch")]
    pub max_tokens_per_batch: u32,
    /// Batches estimated above this are split instead of summarized
    #[serde(default = "default_hard_ceiling")]
    pub hard_ceiling: u32,
    /// Tone requested in merge prompts
    #[serde(default = "default_tone")]
    pub tone: String,
    /// Model hint passed to the client
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub execution: Execution,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    /// Raw items per chunk in the first pass of the two-stage pipeline
    #[serde(default = "default_first_pass_chunk_size")]
    pub first_pass_chunk_size: usize,
}

fn default_max_tokens_per_batch() -> u32 {
    DEFAULT_MAX_TOKENS_PER_BATCH
}

fn default_hard_ceiling() -> u32 {
    DEFAULT_HARD_CEILING
}

fn default_tone() -> String {
    "Professional".to_string()
}

fn default_model() -> String {
    "mistral".to_string()
}

fn default_max_rounds() -> usize {
    DEFAULT_MAX_ROUNDS
}

fn default_first_pass_chunk_size() -> usize {
    DEFAULT_FIRST_PASS_CHUNK_SIZE
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_batch: DEFAULT_MAX_TOKENS_PER_BATCH,
            hard_ceiling: DEFAULT_HARD_CEILING,
            tone: default_tone(),
            model: default_model(),
            execution: Execution::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            first_pass_chunk_size: DEFAULT_FIRST_PASS_CHUNK_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens_per_batch(mut self, max_tokens: u32) -> Self {
        self.max_tokens_per_batch = max_tokens;
        self
    }

    pub fn with_hard_ceiling(mut self, ceiling: u32) -> Self {
        self.hard_ceiling = ceiling;
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Smallest hard ceiling accepted for the current batch ceiling.
    ///
    /// Batches are priced as the sum of their units, but summarized as one text
    /// joined by blank lines. The extra half covers the separators so that a
    /// multi-unit batch never trips the hard ceiling on its own.
    pub fn min_hard_ceiling(&self) -> u32 {
        self.max_tokens_per_batch
            .saturating_add(self.max_tokens_per_batch / 2)
    }

    /// Check the configuration before any backend call is made.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens_per_batch == 0 {
            return Err(MergeError::InvalidConfig(
                "max_tokens_per_batch must be greater than zero".to_string(),
            ));
        }

        if self.hard_ceiling < self.min_hard_ceiling() {
            return Err(MergeError::InvalidConfig(format!(
                "hard_ceiling ({}) must be at least {} for max_tokens_per_batch {}",
                self.hard_ceiling,
                self.min_hard_ceiling(),
                self.max_tokens_per_batch
            )));
        }

        if self.max_rounds == 0 {
            return Err(MergeError::InvalidConfig(
                "max_rounds must be greater than zero".to_string(),
            ));
        }

        if self.first_pass_chunk_size == 0 {
            return Err(MergeError::InvalidConfig(
                "first_pass_chunk_size must be greater than zero".to_string(),
            ));
        }

        if let Execution::Concurrent { max_in_flight: 0 } = self.execution {
            return Err(MergeError::InvalidConfig(
                "max_in_flight must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

//! Token estimation for batch budgeting.
//!
//! Provides heuristic token estimation (chars/4) without any tokenizer or
//! network round-trip. Estimates only need to be conservative enough that large
//! inputs are never systematically under-counted.

use std::sync::Arc;

/// Trait for token estimation implementations.
pub trait TokenEstimator: Send + Sync {
    /// Estimate tokens in a plain text string.
    fn estimate(&self, text: &str) -> u32;

    /// Estimate tokens in several texts, summed.
    fn estimate_all(&self, texts: &[String]) -> u32 {
        texts
            .iter()
            .map(|t| self.estimate(t))
            .fold(0u32, |acc, x| acc.saturating_add(x))
    }
}

/// Heuristic estimator using character-based approximation.
///
/// Uses `tokens ≈ ceil(characters / chars_per_token * safety_margin)`.
/// Characters are Unicode scalar values, not bytes.
#[derive(Debug, Clone)]
pub struct HeuristicTokenEstimator {
    /// Characters per token ratio (default: 4)
    chars_per_token: f64,
    /// Safety margin multiplier (default: 1.0)
    safety_margin: f64,
}

impl HeuristicTokenEstimator {
    /// Create a new heuristic estimator with custom parameters.
    pub fn new(chars_per_token: f64, safety_margin: f64) -> Self {
        Self {
            chars_per_token,
            safety_margin,
        }
    }

    /// Create with default parameters (chars/4, no extra margin).
    pub fn with_defaults() -> Self {
        Self {
            chars_per_token: 4.0,
            safety_margin: 1.0,
        }
    }
}

impl Default for HeuristicTokenEstimator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TokenEstimator for HeuristicTokenEstimator {
    fn estimate(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }

        let char_count = text.chars().count() as f64;
        let adjusted = char_count / self.chars_per_token * self.safety_margin;

        // `as` saturates for out-of-range floats
        adjusted.ceil() as u32
    }
}

/// Arc-wrapped estimator for easy sharing.
pub type SharedTokenEstimator = Arc<dyn TokenEstimator>;

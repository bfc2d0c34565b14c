use serde::{Deserialize, Serialize};

/// Progress reported while a merge runs.
///
/// `depth` is 0 for the top-level merge and grows by one for every nested
/// merge started by the oversized-batch fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MergeEvent {
    RoundStarted {
        depth: usize,
        round: usize,
        units: usize,
        batches: usize,
    },

    BatchSummarized {
        depth: usize,
        round: usize,
        batch: usize,
        input_tokens: u32,
    },

    /// Emitted when a batch exceeds the hard ceiling and is split
    BatchSplit {
        depth: usize,
        round: usize,
        batch: usize,
        tokens: u32,
        parts: usize,
    },

    Converged {
        depth: usize,
        rounds: usize,
    },
}

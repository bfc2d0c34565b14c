//! Errors surfaced by the merge pipeline.

use thiserror::Error;

use crate::client::BackendError;

/// Errors that can occur while merging.
///
/// Every variant aborts the whole invocation; no partially merged text is
/// ever returned alongside one.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Malformed configuration, rejected before any backend call
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// Nothing to merge
    #[error("No items to merge")]
    EmptyInput,

    /// A summarization call returned no usable text
    #[error("Summarization failed for batch {batch} in round {round}: {source}")]
    BackendCallFailed {
        round: usize,
        batch: usize,
        #[source]
        source: BackendError,
    },

    /// Text at sentence granularity still exceeds the hard ceiling
    #[error("Unit of {tokens} tokens exceeds the hard ceiling ({ceiling} tokens) and cannot be split further. Reduce the input size.")]
    UnsplittableUnit { tokens: u32, ceiling: u32 },

    /// The working set stopped shrinking, or splits nested too deeply
    #[error("Merge did not converge (round {rounds}, split depth {depth})")]
    NotConverging { rounds: usize, depth: usize },

    /// Caller cancelled the pipeline
    #[error("Merge cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MergeError>;

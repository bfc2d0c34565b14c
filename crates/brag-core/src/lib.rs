//! Hierarchical, token-budget-aware summarization.
//!
//! Takes an arbitrary number of text items, groups them into batches that fit a
//! model's input budget, summarizes each batch, and re-merges the summaries
//! round after round until a single text remains.
//!
//! # Key Components
//!
//! - [`estimator`]: Token estimation via character heuristics
//! - [`batcher`]: Token-aware grouping of units into batches
//! - [`splitter`]: Paragraph/sentence splitting for oversized text
//! - [`client`]: The `SummarizationClient` seam to the language model
//! - [`merger`]: The recursive merge loop
//! - [`pipeline`]: Caller-facing entry points

pub mod batcher;
pub mod client;
pub mod config;
pub mod error;
pub mod estimator;
pub mod events;
pub mod merger;
pub mod pipeline;
pub mod prompt;
pub mod splitter;

pub use batcher::{chunk_by_count, Batch, TokenAwareBatcher};
pub use client::{BackendError, SharedSummarizationClient, SummarizationClient};
pub use config::{Execution, PipelineConfig};
pub use error::{MergeError, Result};
pub use estimator::{HeuristicTokenEstimator, SharedTokenEstimator, TokenEstimator};
pub use events::MergeEvent;
pub use merger::RecursiveMerger;
pub use pipeline::{merge_all, BragSheetPipeline};
pub use prompt::{DefaultPrompts, PromptBuilder};
pub use splitter::{split_oversized, split_paragraphs, split_sentences};

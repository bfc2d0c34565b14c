//! Caller-facing entry points.

use crate::batcher::chunk_by_count;
use crate::client::SharedSummarizationClient;
use crate::config::{PipelineConfig, DEFAULT_HARD_CEILING};
use crate::error::{MergeError, Result};
use crate::merger::RecursiveMerger;

/// Merge `items` into one text with the given tone and batch ceiling.
///
/// The hard ceiling stays at its default unless the batch ceiling needs more
/// headroom, in which case the smallest valid hard ceiling is used.
pub async fn merge_all(
    client: SharedSummarizationClient,
    items: Vec<String>,
    tone: &str,
    max_tokens_per_batch: u32,
) -> Result<String> {
    RecursiveMerger::new(client, merge_all_config(tone, max_tokens_per_batch))
        .merge(items)
        .await
}

fn merge_all_config(tone: &str, max_tokens_per_batch: u32) -> PipelineConfig {
    let mut config = PipelineConfig::default()
        .with_tone(tone)
        .with_max_tokens_per_batch(max_tokens_per_batch);
    config.hard_ceiling = DEFAULT_HARD_CEILING.max(config.min_hard_ceiling());
    config
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .collect()
}

/// The full brag-sheet flow: summarize raw notes in fixed-size chunks, then
/// merge the chunk summaries down to one text.
#[derive(Debug)]
pub struct BragSheetPipeline {
    merger: RecursiveMerger,
}

impl BragSheetPipeline {
    pub fn new(client: SharedSummarizationClient, config: PipelineConfig) -> Self {
        Self {
            merger: RecursiveMerger::new(client, config),
        }
    }

    /// Build around a preconfigured merger (estimator, prompts, cancellation,
    /// progress channel).
    pub fn from_merger(merger: RecursiveMerger) -> Self {
        Self { merger }
    }

    pub fn merger(&self) -> &RecursiveMerger {
        &self.merger
    }

    /// Summarize `items` into a single brag sheet.
    ///
    /// Runs [`first_pass`](Self::first_pass), then merges the chunk summaries.
    pub async fn generate(&self, items: Vec<String>) -> Result<String> {
        let summaries = self.first_pass(items).await?;

        log::info!("Merging {} chunk summaries", summaries.len());
        self.merger.merge(summaries).await
    }

    /// Rewrite chunks of `first_pass_chunk_size` raw items with the batch
    /// prompt, one summary per chunk, in input order. Chunks too large for one
    /// call go through the merger instead.
    pub async fn first_pass(&self, items: Vec<String>) -> Result<Vec<String>> {
        let config = self.merger.config();
        config.validate()?;

        let items = non_blank(items);
        if items.is_empty() {
            return Err(MergeError::EmptyInput);
        }

        let chunks = chunk_by_count(items, config.first_pass_chunk_size)?;
        log::info!("First pass over {} chunks", chunks.len());

        let jobs = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| self.summarize_chunk(chunk, i + 1));
        self.merger.dispatch(jobs).await
    }

    /// Rewrite all `items` with one batch prompt.
    ///
    /// Falls back to [`generate`](Self::generate) when the items do not fit
    /// under the hard ceiling together.
    pub async fn single_batch(&self, items: Vec<String>) -> Result<String> {
        let config = self.merger.config();
        config.validate()?;

        let items = non_blank(items);
        if items.is_empty() {
            return Err(MergeError::EmptyInput);
        }

        let tokens = self.merger.estimate(&items.join("\n"));
        if tokens > config.hard_ceiling {
            log::warn!(
                "Single batch of {} tokens exceeds hard ceiling {}, using chunked generation",
                tokens,
                config.hard_ceiling
            );
            return self.generate(items).await;
        }

        let prompt = self.merger.prompts().batch_prompt(&items, &config.tone);
        self.merger.summarize(&prompt, 0, 1).await
    }

    /// Pick the single most impactful accomplishment from one section.
    pub async fn highlight_section(&self, section: &str) -> Result<String> {
        if section.trim().is_empty() {
            return Err(MergeError::EmptyInput);
        }

        let tokens = self.merger.estimate(section);
        let ceiling = self.merger.config().hard_ceiling;
        if tokens > ceiling {
            return Err(MergeError::UnsplittableUnit { tokens, ceiling });
        }

        let prompt = self.merger.prompts().section_prompt(section);
        self.merger.summarize(&prompt, 0, 1).await
    }

    async fn summarize_chunk(&self, chunk: Vec<String>, index: usize) -> Result<String> {
        let config = self.merger.config();
        let tokens = self.merger.estimate(&chunk.join("\n"));

        if tokens > config.hard_ceiling {
            log::warn!(
                "Chunk {} too large ({} tokens), merging it recursively",
                index,
                tokens
            );
            return self.merger.merge(chunk).await;
        }

        let prompt = self.merger.prompts().batch_prompt(&chunk, &config.tone);
        self.merger.summarize(&prompt, 0, index).await
    }
}

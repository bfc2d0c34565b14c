//! Recursive merge of units into a single text.
//!
//! Each round partitions the working set into token-bounded batches and
//! collapses every batch into one summary. Rounds repeat until one unit is
//! left. A batch whose combined text is still over the hard ceiling is split
//! into paragraphs (or sentences) and merged by a nested invocation sharing the
//! same configuration, whose single result takes the batch's place.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::batcher::{Batch, TokenAwareBatcher};
use crate::client::{BackendError, SharedSummarizationClient};
use crate::config::{Execution, PipelineConfig};
use crate::error::{MergeError, Result};
use crate::estimator::{HeuristicTokenEstimator, SharedTokenEstimator};
use crate::events::MergeEvent;
use crate::prompt::{DefaultPrompts, PromptBuilder};
use crate::splitter::split_oversized;

/// Nested split merges allowed before giving up.
const MAX_SPLIT_DEPTH: usize = 32;

/// Consecutive rounds of only single-unit batches allowed before giving up.
const MAX_STALLED_ROUNDS: usize = 2;

pub struct RecursiveMerger {
    client: SharedSummarizationClient,
    config: PipelineConfig,
    estimator: SharedTokenEstimator,
    prompts: Arc<dyn PromptBuilder>,
    cancel_token: CancellationToken,
    events: Option<mpsc::Sender<MergeEvent>>,
}

impl std::fmt::Debug for RecursiveMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveMerger")
            .field("config", &self.config)
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl RecursiveMerger {
    pub fn new(client: SharedSummarizationClient, config: PipelineConfig) -> Self {
        Self {
            client,
            config,
            estimator: Arc::new(HeuristicTokenEstimator::default()),
            prompts: Arc::new(DefaultPrompts),
            cancel_token: CancellationToken::new(),
            events: None,
        }
    }

    pub fn with_estimator(mut self, estimator: SharedTokenEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_prompts(mut self, prompts: Arc<dyn PromptBuilder>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Use `token` to cancel the merge from outside.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Report progress on `tx`. The receiver should be drained while the merge
    /// runs; a full channel suspends the merge until it drains or is cancelled.
    pub fn with_events(mut self, tx: mpsc::Sender<MergeEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    pub(crate) fn prompts(&self) -> &dyn PromptBuilder {
        self.prompts.as_ref()
    }

    pub(crate) fn estimate(&self, text: &str) -> u32 {
        self.estimator.estimate(text)
    }

    /// Merge `units` into one text.
    ///
    /// Blank units carry nothing and are ignored. A single remaining unit is
    /// returned as-is without calling the backend.
    pub async fn merge(&self, units: Vec<String>) -> Result<String> {
        self.config.validate()?;

        let units: Vec<String> = units
            .into_iter()
            .filter(|unit| !unit.trim().is_empty())
            .collect();
        if units.is_empty() {
            return Err(MergeError::EmptyInput);
        }

        log::info!("Starting merge of {} units", units.len());
        self.merge_at_depth(units, 0).await
    }

    fn merge_at_depth(&self, units: Vec<String>, depth: usize) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            if depth > MAX_SPLIT_DEPTH {
                return Err(MergeError::NotConverging {
                    rounds: 0,
                    depth,
                });
            }

            let mut working = units;
            let mut round = 0usize;
            let mut stalled_rounds = 0usize;

            loop {
                if working.len() == 1 {
                    self.emit(MergeEvent::Converged {
                        depth,
                        rounds: round,
                    })
                    .await?;
                    return working.pop().ok_or(MergeError::EmptyInput);
                }
                if round >= self.config.max_rounds {
                    return Err(MergeError::NotConverging {
                        rounds: round,
                        depth,
                    });
                }

                self.ensure_not_cancelled()?;
                round += 1;

                let input_len = working.len();
                let input_tokens = self.estimator.estimate_all(&working);
                let batches = TokenAwareBatcher::new(self.estimator.as_ref())
                    .batch(working, self.config.max_tokens_per_batch)?;

                log::info!(
                    "Merging {} units in {} batches (depth {}, round {})",
                    input_len,
                    batches.len(),
                    depth,
                    round
                );
                self.emit(MergeEvent::RoundStarted {
                    depth,
                    round,
                    units: input_len,
                    batches: batches.len(),
                })
                .await?;

                let total = batches.len();
                let jobs = batches
                    .into_iter()
                    .enumerate()
                    .map(move |(i, batch)| self.reduce_batch(batch, depth, round, i + 1, total));
                working = self.dispatch(jobs).await?;

                // Every batch held one unit, so only shrinking text can let
                // later rounds combine anything.
                if working.len() >= input_len {
                    stalled_rounds += 1;
                    let output_tokens = self.estimator.estimate_all(&working);
                    if output_tokens >= input_tokens || stalled_rounds >= MAX_STALLED_ROUNDS {
                        log::warn!(
                            "Round {} at depth {} did not shrink {} units ({} -> {} tokens)",
                            round,
                            depth,
                            input_len,
                            input_tokens,
                            output_tokens
                        );
                        return Err(MergeError::NotConverging {
                            rounds: round,
                            depth,
                        });
                    }
                } else {
                    stalled_rounds = 0;
                }
            }
        })
    }

    /// Collapse one batch into one unit, splitting first if it is too large.
    async fn reduce_batch(
        &self,
        batch: Batch,
        depth: usize,
        round: usize,
        index: usize,
        total: usize,
    ) -> Result<String> {
        self.ensure_not_cancelled()?;

        let combined = batch.combined_text();
        let tokens = self.estimator.estimate(&combined);
        log::debug!(
            "Batch {}/{} ({} units), estimated {} tokens",
            index,
            total,
            batch.len(),
            tokens
        );

        if tokens > self.config.hard_ceiling {
            log::warn!(
                "Batch {} too large ({} tokens > {}), splitting further",
                index,
                tokens,
                self.config.hard_ceiling
            );

            let parts = split_oversized(&combined).ok_or(MergeError::UnsplittableUnit {
                tokens,
                ceiling: self.config.hard_ceiling,
            })?;

            self.emit(MergeEvent::BatchSplit {
                depth,
                round,
                batch: index,
                tokens,
                parts: parts.len(),
            })
            .await?;

            return self.merge_at_depth(parts, depth + 1).await;
        }

        let prompt = self.prompts.merge_prompt(&combined, &self.config.tone);
        let summary = self.summarize(&prompt, round, index).await?;

        self.emit(MergeEvent::BatchSummarized {
            depth,
            round,
            batch: index,
            input_tokens: tokens,
        })
        .await?;

        Ok(summary)
    }

    /// Send one prompt to the backend, racing it against cancellation.
    ///
    /// Output is trimmed; blank output is a failure of the batch.
    pub(crate) async fn summarize(&self, prompt: &str, round: usize, batch: usize) -> Result<String> {
        let result = tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => return Err(MergeError::Cancelled),
            result = self.client.generate(prompt, &self.config.model) => result,
        };

        let output = result.map_err(|source| {
            log::error!("Summarization failed for batch {} in round {}: {}", batch, round, source);
            MergeError::BackendCallFailed {
                round,
                batch,
                source,
            }
        })?;

        let trimmed = output.trim();
        if trimmed.is_empty() {
            return Err(MergeError::BackendCallFailed {
                round,
                batch,
                source: BackendError::EmptyResponse,
            });
        }

        Ok(trimmed.to_string())
    }

    /// Run batch jobs according to the configured execution mode.
    ///
    /// Results come back in job order in both modes. The first failure drops
    /// every job still pending or in flight.
    pub(crate) async fn dispatch<I, F>(&self, jobs: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<String>>,
    {
        match self.config.execution {
            Execution::Sequential => {
                let mut outputs = Vec::new();
                for job in jobs {
                    outputs.push(job.await?);
                }
                Ok(outputs)
            }
            Execution::Concurrent { max_in_flight } => {
                stream::iter(jobs)
                    .buffered(max_in_flight.max(1))
                    .try_collect()
                    .await
            }
        }
    }

    fn ensure_not_cancelled(&self) -> Result<()> {
        if self.cancel_token.is_cancelled() {
            return Err(MergeError::Cancelled);
        }
        Ok(())
    }

    /// Send a progress event. A receiver that stops draining cannot hold the
    /// merge past cancellation; a dropped receiver is ignored.
    async fn emit(&self, event: MergeEvent) -> Result<()> {
        if let Some(tx) = &self.events {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => return Err(MergeError::Cancelled),
                _ = tx.send(event) => {}
            }
        }
        Ok(())
    }
}

//! Token-aware batching.
//!
//! Groups an ordered sequence of units into batches whose summed token estimate
//! stays under a ceiling. Order is preserved and no unit is dropped, split, or
//! duplicated here; oversized units are isolated for the merger to split.

use crate::error::{MergeError, Result};
use crate::estimator::TokenEstimator;

/// An ordered, non-empty group of units summarized by one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Units in their original order
    pub units: Vec<String>,
    /// Sum of the units' token estimates
    pub token_estimate: u32,
}

impl Batch {
    fn from_unit(unit: String, tokens: u32) -> Self {
        Self {
            units: vec![unit],
            token_estimate: tokens,
        }
    }

    fn push(&mut self, unit: String, tokens: u32) {
        self.units.push(unit);
        self.token_estimate = self.token_estimate.saturating_add(tokens);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Join the units with a blank line between them.
    pub fn combined_text(&self) -> String {
        self.units.join("\n\n")
    }
}

/// Groups units into token-bounded batches.
///
/// # Algorithm
///
/// 1. Scan units in order, keeping a running token sum for the open batch
/// 2. If adding the next unit would exceed the ceiling, close the open batch
///    and start a new one with that unit
/// 3. A unit that alone exceeds the ceiling ends up alone in its batch
pub struct TokenAwareBatcher<'a> {
    estimator: &'a dyn TokenEstimator,
}

impl<'a> TokenAwareBatcher<'a> {
    pub fn new(estimator: &'a dyn TokenEstimator) -> Self {
        Self { estimator }
    }

    /// Partition `units` into batches of at most `max_tokens_per_batch`.
    pub fn batch(&self, units: Vec<String>, max_tokens_per_batch: u32) -> Result<Vec<Batch>> {
        if max_tokens_per_batch == 0 {
            return Err(MergeError::InvalidConfig(
                "max_tokens_per_batch must be greater than zero".to_string(),
            ));
        }

        let mut batches: Vec<Batch> = Vec::new();
        let mut current: Option<Batch> = None;

        for unit in units {
            let tokens = self.estimator.estimate(&unit);

            match current {
                Some(ref mut batch)
                    if batch.token_estimate.saturating_add(tokens) <= max_tokens_per_batch =>
                {
                    batch.push(unit, tokens);
                }
                _ => {
                    if let Some(done) = current.take() {
                        batches.push(done);
                    }
                    current = Some(Batch::from_unit(unit, tokens));
                }
            }
        }

        if let Some(done) = current {
            batches.push(done);
        }

        Ok(batches)
    }
}

/// Split `units` into consecutive chunks of at most `size` units.
///
/// Used for the count-based first pass, where raw items are summarized in
/// fixed-size groups before token-aware merging takes over.
pub fn chunk_by_count(units: Vec<String>, size: usize) -> Result<Vec<Vec<String>>> {
    if size == 0 {
        return Err(MergeError::InvalidConfig(
            "chunk size must be greater than zero".to_string(),
        ));
    }

    let mut chunks = Vec::with_capacity(units.len().div_ceil(size));
    let mut iter = units.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(size).collect());
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::HeuristicTokenEstimator;

    fn text_of_tokens(tokens: usize, tag: char) -> String {
        // Default estimator: 4 chars per token
        tag.to_string().repeat(tokens * 4)
    }

    fn batch_sizes(batches: &[Batch]) -> Vec<usize> {
        batches.iter().map(Batch::len).collect()
    }

    #[test]
    fn pairs_thousand_token_items_under_two_thousand_ceiling() {
        let estimator = HeuristicTokenEstimator::default();
        let batcher = TokenAwareBatcher::new(&estimator);
        let items: Vec<String> = ['a', 'b', 'c', 'd']
            .iter()
            .map(|tag| text_of_tokens(1000, *tag))
            .collect();

        let batches = batcher.batch(items.clone(), 2000).unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].units, vec![items[0].clone(), items[1].clone()]);
        assert_eq!(batches[1].units, vec![items[2].clone(), items[3].clone()]);
        assert!(batches.iter().all(|b| b.token_estimate <= 2000));
    }

    #[test]
    fn oversized_unit_is_isolated_not_dropped() {
        let estimator = HeuristicTokenEstimator::default();
        let batcher = TokenAwareBatcher::new(&estimator);
        let items = vec![
            text_of_tokens(10, 'a'),
            text_of_tokens(500, 'b'),
            text_of_tokens(10, 'c'),
        ];

        let batches = batcher.batch(items, 100).unwrap();

        assert_eq!(batch_sizes(&batches), vec![1, 1, 1]);
        assert_eq!(batches[1].token_estimate, 500);
    }

    #[test]
    fn preserves_order_and_every_unit() {
        let estimator = HeuristicTokenEstimator::default();
        let batcher = TokenAwareBatcher::new(&estimator);
        let items: Vec<String> = (0..25).map(|i| format!("item number {i} with some text")).collect();

        let batches = batcher.batch(items.clone(), 20).unwrap();
        let flattened: Vec<String> = batches.into_iter().flat_map(|b| b.units).collect();

        assert_eq!(flattened, items);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let estimator = HeuristicTokenEstimator::default();
        let batcher = TokenAwareBatcher::new(&estimator);

        assert!(batcher.batch(Vec::new(), 100).unwrap().is_empty());
    }

    #[test]
    fn zero_ceiling_fails_fast() {
        let estimator = HeuristicTokenEstimator::default();
        let batcher = TokenAwareBatcher::new(&estimator);

        let result = batcher.batch(vec!["a".to_string()], 0);
        assert!(matches!(result, Err(MergeError::InvalidConfig(_))));
    }

    #[test]
    fn chunk_by_count_keeps_remainder() {
        let units: Vec<String> = (0..19).map(|i| i.to_string()).collect();

        let chunks = chunk_by_count(units, 8).unwrap();

        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![8, 8, 3]);
        assert_eq!(chunks[2], vec!["16", "17", "18"]);
    }

    #[test]
    fn chunk_by_count_rejects_zero() {
        assert!(chunk_by_count(vec!["a".to_string()], 0).is_err());
    }
}

use crate::buffer::{BoundedQueue, CloseOnDrop};
use crate::metrics::StageMetrics;
use std::collections::HashMap;
use tracing::debug;

/// Accumulates case-insensitive word counts.
///
/// A counter has a single owner; the pipeline runs it on one thread as the
/// sole consumer of the token stream, so the map needs no locking.
#[derive(Debug, Default)]
pub struct FrequencyCounter {
    counts: HashMap<String, u64>,
    total: u64,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one token under its upper-cased form, using full Unicode case
    /// mapping (`ß` becomes `SS`)
    pub fn record(&mut self, token: &str) {
        self.total += 1;
        *self.counts.entry(token.to_uppercase()).or_insert(0) += 1;
    }

    /// Count every token until the queue is closed and drained
    pub fn consume(mut self, tokens: &BoundedQueue<String>, metrics: &StageMetrics) -> FrequencyTable {
        // Closing on exit releases a tokenizer blocked on a full queue if we
        // ever stop early.
        let _close = CloseOnDrop(tokens);
        while let Some(token) = tokens.pop() {
            metrics.record_received();
            self.record(&token);
        }
        debug!(total = self.total, distinct = self.counts.len(), "token stream drained");
        self.finish()
    }

    pub fn finish(self) -> FrequencyTable {
        FrequencyTable {
            counts: self.counts,
            total: self.total,
        }
    }
}

/// The final word → count mapping and the number of tokens counted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
    total: u64,
}

impl FrequencyTable {
    /// Total tokens counted; always equals the sum of all counts
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct normalized words
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count for an already-normalized (upper-case) word
    pub fn get(&self, word: &str) -> Option<u64> {
        self.counts.get(word).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(word, count)| (word.as_str(), *count))
    }
}

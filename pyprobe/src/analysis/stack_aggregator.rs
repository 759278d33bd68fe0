//! Stack aggregation for folded output.
//!
//! Reduces the chronological samples of a run to one bucket per distinct
//! call stack.
//!
//! # Performance
//!
//! - `record()`: O(stack depth) amortized (hash + structural compare)
//! - `into_buckets()`: O(unique stacks), no sorting; ordering is a
//!   formatting concern
//! - Memory: one owned copy of each distinct stack

use std::collections::HashMap;

use crate::domain::{FrameSequence, RunResult};

/// A distinct call stack and how many samples captured it.
///
/// `frames` is never idle; idle ticks are reported through
/// [`RunResult::idle_count`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub frames: FrameSequence,
    pub count: usize,
}

/// Counts samples per distinct stack.
#[derive(Debug, Default)]
pub struct StackAggregator {
    counts: HashMap<FrameSequence, usize>,
}

impl StackAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate every sample of a run.
    #[must_use]
    pub fn from_run(result: &RunResult) -> Self {
        let mut aggregator = Self::new();
        for sample in &result.samples {
            aggregator.record(&sample.frames);
        }
        aggregator
    }

    /// Count one capture; idle sequences are ignored.
    pub fn record(&mut self, frames: &FrameSequence) {
        if frames.is_idle() {
            return;
        }
        // Only clone the sequence the first time we see it
        if let Some(count) = self.counts.get_mut(frames) {
            *count += 1;
        } else {
            self.counts.insert(frames.clone(), 1);
        }
    }

    /// Number of distinct stacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Samples counted across all buckets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    #[cfg(test)]
    fn count_of(&self, frames: &FrameSequence) -> usize {
        self.counts.get(frames).copied().unwrap_or(0)
    }

    /// Buckets in unspecified order.
    #[must_use]
    pub fn into_buckets(self) -> Vec<Bucket> {
        self.counts.into_iter().map(|(frames, count)| Bucket { frames, count }).collect()
    }
}

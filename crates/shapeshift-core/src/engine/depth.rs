//! Per-branch recursion counters
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use std::collections::HashMap;
use std::num::NonZeroUsize;

/// Counts how often each depth-limited pair was entered along one branch
///
/// Trackers are cloned at every fork of the object graph, so siblings never
/// see each other's counts.
#[derive(Debug, Clone, Default)]
pub struct DepthTracker {
    counts: HashMap<u64, usize>,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more entry of `pair`; false once the branch is too deep
    ///
    /// The first entry is always allowed.
    pub fn enter(&mut self, pair: u64, limit: NonZeroUsize) -> bool {
        match self.counts.get_mut(&pair) {
            Some(count) => {
                *count += 1;
                *count < limit.get()
            }
            None => {
                self.counts.insert(pair, 1);
                true
            }
        }
    }

    pub fn count(&self, pair: u64) -> usize {
        self.counts.get(&pair).copied().unwrap_or(0)
    }
}

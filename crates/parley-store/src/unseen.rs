use std::collections::HashMap;

use parley_shared::PeerId;
use serde::Serialize;

/// Client-side badge counters: messages pushed by a peer while their
/// conversation was not open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnseenCounts {
    counts: HashMap<PeerId, u32>,
}

impl UnseenCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unseen message from `peer` and return the new count.
    pub fn increment(&mut self, peer: &PeerId) -> u32 {
        let count = self.counts.entry(peer.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn reset(&mut self, peer: &PeerId) {
        self.counts.insert(peer.clone(), 0);
    }

    pub fn replace(&mut self, counts: HashMap<PeerId, u32>) {
        self.counts = counts;
    }

    pub fn get(&self, peer: &PeerId) -> u32 {
        self.counts.get(peer).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }
}

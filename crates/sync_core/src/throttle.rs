//! Per-id rate limiting for progress notifications.
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::EntityId;

/// The last sample forwarded for one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub emitted_at: Instant,
    pub processed: u64,
    pub total: u64,
}

impl ProgressSample {
    pub fn is_terminal(&self) -> bool {
        self.processed == self.total
    }
}

/// Forwards at most one sample per id per interval. A terminal sample
/// (`processed == total`) is always forwarded; samples in between are discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressThrottler {
    min_interval: Duration,
    last: BTreeMap<EntityId, ProgressSample>,
}

impl ProgressThrottler {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: BTreeMap::new(),
        }
    }

    pub fn accept(
        &mut self,
        id: &str,
        processed: u64,
        total: u64,
        now: Instant,
    ) -> Option<ProgressSample> {
        let sample = ProgressSample {
            emitted_at: now,
            processed,
            total,
        };
        let due = match self.last.get(id) {
            Some(previous) => now.saturating_duration_since(previous.emitted_at) >= self.min_interval,
            None => true,
        };
        if !due && !sample.is_terminal() {
            return None;
        }

        // A finished id starts over with a clean window.
        if sample.is_terminal() {
            self.last.remove(id);
        } else {
            self.last.insert(id.to_string(), sample);
        }
        Some(sample)
    }

    pub fn last_delivered(&self, id: &str) -> Option<&ProgressSample> {
        self.last.get(id)
    }

    pub fn tracked(&self) -> usize {
        self.last.len()
    }

    pub fn forget(&mut self, id: &str) {
        self.last.remove(id);
    }

    /// Drops every tracked id for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.last.retain(|id, _| keep(id));
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }
}

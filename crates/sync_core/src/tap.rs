//! Passive diagnostics: sees every frame the decoder handles, routed or not.
use std::collections::VecDeque;

use sync_logging::sync_debug;

use crate::EntityFamily;

const EXCERPT_LIMIT: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapEntry {
    Decoded {
        tag: String,
        family: Option<EntityFamily>,
    },
    Dropped {
        reason: String,
        excerpt: String,
    },
}

/// Bounded history of decoder output; the oldest entries fall off first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugTap {
    capacity: usize,
    entries: VecDeque<TapEntry>,
    observed: u64,
}

impl DebugTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(1024)),
            observed: 0,
        }
    }

    pub fn observe_decoded(&mut self, tag: &str, family: Option<EntityFamily>) {
        sync_debug!("tap: decoded `{tag}` for {family:?}");
        self.push(TapEntry::Decoded {
            tag: tag.to_string(),
            family,
        });
    }

    pub fn observe_dropped(&mut self, reason: &str, raw: &str) {
        let excerpt = excerpt(raw);
        sync_debug!("tap: dropped frame ({reason}): {excerpt}");
        self.push(TapEntry::Dropped {
            reason: reason.to_string(),
            excerpt,
        });
    }

    /// Total entries seen, including ones already evicted.
    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn entries(&self) -> impl Iterator<Item = &TapEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: TapEntry) {
        self.observed += 1;
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

fn excerpt(raw: &str) -> String {
    if raw.len() <= EXCERPT_LIMIT {
        return raw.to_string();
    }
    let mut end = EXCERPT_LIMIT;
    while end > 0 && !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw[..end])
}

//! # Replay cache: bounded per-event FIFO of undelivered emissions.
//!
//! [`ReplayCache`] stores payloads that were emitted while an event name had
//! zero subscribers, so a later subscriber can still observe them. Each event
//! name gets its own queue, bounded independently.
//!
//! ## Rules
//! - **Append-only from emit**: only the bus pushes entries, and only when an
//!   emit found no subscribers.
//! - **FIFO eviction**: beyond the configured bound the oldest entry is evicted.
//! - **Consumed on replay**: the bus drains a name's queue after replaying it,
//!   unless configured to persist.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;

/// One cached emission: payload plus the wall-clock time it was emitted.
#[derive(Clone, Debug)]
pub struct CachedEmission<P> {
    /// Payload as passed to `emit`.
    pub payload: P,
    /// Wall-clock timestamp of the original emit.
    pub at: SystemTime,
}

/// Per-event-name bounded queues of cached emissions.
#[derive(Debug)]
pub struct ReplayCache<P> {
    entries: HashMap<Arc<str>, VecDeque<CachedEmission<P>>>,
}

impl<P> ReplayCache<P> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Appends a payload for `name`, evicting oldest entries beyond `limit`.
    ///
    /// `limit = None` means unbounded.
    pub fn push(&mut self, name: Arc<str>, payload: P, limit: Option<usize>) {
        let queue = self.entries.entry(name).or_default();
        queue.push_back(CachedEmission {
            payload,
            at: SystemTime::now(),
        });

        if let Some(max) = limit {
            while queue.len() > max {
                queue.pop_front();
            }
        }
    }

    /// Returns the cached entries for `name` in emit order, oldest first.
    pub fn snapshot(&self, name: &str) -> Vec<CachedEmission<P>>
    where
        P: Clone,
    {
        self.entries
            .get(name)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of cached entries for `name`.
    pub fn count(&self, name: &str) -> usize {
        self.entries.get(name).map(VecDeque::len).unwrap_or(0)
    }

    /// Sorted list of event names that currently have cached entries.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Drops the cached entries for one event name.
    pub fn remove(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Drops all cached entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<P> Default for ReplayCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

//! # Event bus configuration.
//!
//! Provides [`BusOptions`] centralized settings for [`EventBus`](crate::EventBus).
//!
//! ## Sentinel values
//! - `max_cache_size = 0` → unbounded (no eviction on append)
//!
//! Options are read at the operation that uses them, so updating options on a
//! live bus takes effect on the next `emit`/`on` call. Shrinking
//! `max_cache_size` does not retroactively trim queues; the bound is applied
//! on the next append for that event name.

/// Caching configuration for the event bus.
///
/// ## Field semantics
/// - `enable_cache`: cache emissions that found no subscriber (`false` = drop them)
/// - `max_cache_size`: per-event-name cache bound (`0` = unbounded)
/// - `clear_cache_after_subscribe`: drop a name's cache once it was replayed
///
/// All fields are public for flexibility. Prefer [`BusOptions::cache_limit`]
/// over checking the `0` sentinel at call sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusOptions {
    /// Whether emissions with zero subscribers are cached for later replay.
    pub enable_cache: bool,

    /// Maximum cached emissions kept per event name.
    ///
    /// - `0` = unbounded
    /// - `n > 0` = at most `n` entries; oldest evicted first (FIFO)
    pub max_cache_size: usize,

    /// Whether a name's cache is cleared after it was replayed to a new subscriber.
    ///
    /// When `false`, cached emissions persist and replay again for every
    /// subsequent subscriber until cleared explicitly.
    pub clear_cache_after_subscribe: bool,
}

impl BusOptions {
    /// Returns the per-name cache bound as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` cached emissions per event name
    #[inline]
    pub fn cache_limit(&self) -> Option<usize> {
        if self.max_cache_size == 0 {
            None
        } else {
            Some(self.max_cache_size)
        }
    }
}

impl Default for BusOptions {
    /// Default configuration:
    ///
    /// - `enable_cache = true` (emissions survive until the first subscriber)
    /// - `max_cache_size = 10` (per event name)
    /// - `clear_cache_after_subscribe = true` (replay consumes the cache)
    fn default() -> Self {
        Self {
            enable_cache: true,
            max_cache_size: 10,
            clear_cache_after_subscribe: true,
        }
    }
}

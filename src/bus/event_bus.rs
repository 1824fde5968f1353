//! # Event bus: named publish/subscribe with replay of missed emissions.
//!
//! [`EventBus`] maps event names to subscriber lists and keeps a bounded
//! [`ReplayCache`] of payloads that were emitted while a name had no
//! subscribers. The next subscriber for that name observes the cached
//! payloads synchronously, in emit order, before `on` returns.
//!
//! ## Architecture
//! ```text
//! emit(name, payload)
//!     │
//!     ├─ subscribers exist ──► snapshot list ──► cb1 ─► cb2 ─► ... (registration order)
//!     │                                          one-shot subscribers removed after firing
//!     │
//!     └─ no subscribers ─────► ReplayCache[name].push(payload)   (when enabled)
//!                                  └─ FIFO-bounded by BusOptions::max_cache_size
//!
//! on(name, callback)
//!     │
//!     ├─ register subscriber
//!     ├─ replay ReplayCache[name] to the new callback (oldest first)
//!     └─ drop ReplayCache[name]   (unless clear_cache_after_subscribe = false)
//! ```
//!
//! ## Rules
//! - **Snapshot before dispatch**: the subscriber list is cloned before
//!   iteration, so unsubscribing from within a callback neither skips nor
//!   duplicates delivery for that emit.
//! - **Panic isolation**: a panicking callback is caught and logged; delivery
//!   continues with the remaining subscribers.
//! - **No locks during callbacks**: callbacks may freely call back into the
//!   bus (`emit`, `on`, `off`, ...).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use lazybus::{BusOptions, EventBus};
//!
//! let bus: EventBus<u32> = EventBus::new(BusOptions::default());
//!
//! // Emitted before anyone subscribed: cached.
//! bus.emit("score", 7);
//!
//! let seen = Arc::new(AtomicU32::new(0));
//! let seen2 = Arc::clone(&seen);
//! bus.on("score", move |v| { seen2.store(*v, Ordering::SeqCst); });
//!
//! // Replay happened synchronously inside `on`.
//! assert_eq!(seen.load(Ordering::SeqCst), 7);
//! assert_eq!(bus.cache_count("score"), 0);
//! ```

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::cache::ReplayCache;
use super::options::BusOptions;
use super::subscriber::{Subscriber, SubscriptionId};

/// State guarded by a single lock: subscriber lists, cache, and options.
struct Inner<P: 'static> {
    events: HashMap<Arc<str>, Vec<Subscriber<P>>>,
    cache: ReplayCache<P>,
    options: BusOptions,
}

/// Publish/subscribe bus over one payload type `P`.
///
/// `P` is the payload carried by every emission on this bus; hosts with
/// heterogeneous events define a payload enum per bus. The bus is `Send + Sync`
/// when `P: Send`, so a single instance can be shared across a host runtime
/// as an explicit [`Arc`] handle (see [`EventBus::shared`]).
///
/// ### Properties
/// - **Synchronous dispatch**: `emit` and cache replay run on the caller.
/// - **Registration order**: subscribers fire in the order they subscribed.
/// - **Reentrant-safe**: no internal lock is held while callbacks run.
pub struct EventBus<P: 'static> {
    inner: Mutex<Inner<P>>,
}

impl<P> EventBus<P>
where
    P: Clone + 'static,
{
    /// Creates a bus with the given caching options.
    pub fn new(options: BusOptions) -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: HashMap::new(),
                cache: ReplayCache::new(),
                options,
            }),
        }
    }

    /// Creates a bus wrapped in an [`Arc`] handle.
    ///
    /// This is the dependency-injection entry point: the host constructs the
    /// bus once and hands clones of the handle to every component that needs
    /// to publish or subscribe.
    pub fn shared(options: BusOptions) -> Arc<Self> {
        Arc::new(Self::new(options))
    }

    /// Registers a subscriber for `name` and returns its id.
    ///
    /// Cached emissions for `name` (if any) replay synchronously to the new
    /// callback, oldest first, before this method returns. Afterwards the
    /// name's cache is dropped unless
    /// [`BusOptions::clear_cache_after_subscribe`] is `false`.
    ///
    /// Use the returned [`SubscriptionId`] with [`EventBus::off`] to
    /// unsubscribe.
    pub fn on<F>(&self, name: impl Into<Arc<str>>, callback: F) -> SubscriptionId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.subscribe(name.into(), callback, false)
    }

    /// Registers a one-shot subscriber: it fires at most once, then is removed.
    ///
    /// A one-shot subscriber consumes at most one cached emission during
    /// replay (the oldest); it never observes the rest of the cache.
    pub fn once<F>(&self, name: impl Into<Arc<str>>, callback: F) -> SubscriptionId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.subscribe(name.into(), callback, true)
    }

    /// Removes one subscriber from `name`.
    ///
    /// Returns `true` if the subscription existed. Unknown names or ids are a
    /// no-op. The name's entry is dropped once its subscriber list is empty.
    pub fn off(&self, name: &str, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let Some(subs) = inner.events.get_mut(name) else {
            return false;
        };

        let before = subs.len();
        subs.retain(|s| s.id != id);
        let removed = subs.len() != before;

        if subs.is_empty() {
            inner.events.remove(name);
        }
        removed
    }

    /// Removes all subscribers for `name`.
    pub fn off_all(&self, name: &str) {
        self.lock().events.remove(name);
    }

    /// Publishes a payload to all subscribers of `name`, in registration order.
    ///
    /// The subscriber list is snapshotted before iteration: unsubscribing from
    /// within a callback does not affect delivery for this emit. One-shot
    /// subscribers are removed immediately after firing. A panicking callback
    /// is caught and logged; remaining subscribers still fire.
    ///
    /// When no subscribers exist and caching is enabled, the payload is
    /// appended to the name's replay cache, evicting the oldest entry beyond
    /// [`BusOptions::max_cache_size`].
    pub fn emit(&self, name: &str, payload: P) {
        let (listeners, cache_miss) = {
            let inner = self.lock();
            match inner.events.get(name) {
                Some(subs) if !subs.is_empty() => (subs.clone(), false),
                _ => (Vec::new(), inner.options.enable_cache),
            }
        };

        if !listeners.is_empty() {
            for sub in &listeners {
                self.invoke(name, sub, &payload);
                if sub.once {
                    self.off(name, sub.id);
                }
            }
            return;
        }

        if cache_miss {
            let mut inner = self.lock();
            let limit = inner.options.cache_limit();
            inner.cache.push(Arc::from(name), payload, limit);
        }
    }

    /// Number of subscribers currently registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.lock().events.get(name).map(Vec::len).unwrap_or(0)
    }

    /// Sorted list of event names that currently have subscribers.
    pub fn event_names(&self) -> Vec<String> {
        let inner = self.lock();
        let mut names: Vec<String> = inner.events.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Number of cached emissions for `name`.
    pub fn cache_count(&self, name: &str) -> usize {
        self.lock().cache.count(name)
    }

    /// Sorted list of event names that currently have cached emissions.
    pub fn cached_event_names(&self) -> Vec<String> {
        self.lock().cache.names()
    }

    /// Removes all subscribers; also drops the cache when `clear_cache` is set.
    pub fn clear(&self, clear_cache: bool) {
        let mut inner = self.lock();
        inner.events.clear();
        if clear_cache {
            inner.cache.clear();
        }
    }

    /// Drops all cached emissions.
    pub fn clear_cache(&self) {
        self.lock().cache.clear();
    }

    /// Drops the cached emissions for one event name.
    pub fn clear_cache_of(&self, name: &str) {
        self.lock().cache.remove(name);
    }

    /// Returns a copy of the current options.
    pub fn options(&self) -> BusOptions {
        self.lock().options
    }

    /// Replaces the options wholesale.
    ///
    /// Takes effect on the next operation that reads them; existing cache
    /// queues are not retrimmed until their next append.
    pub fn update_options(&self, options: BusOptions) {
        self.lock().options = options;
    }

    /// Registers a subscriber, then replays the name's cache to it.
    fn subscribe<F>(&self, name: Arc<str>, callback: F, once: bool) -> SubscriptionId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let sub = Subscriber::new(callback, once);
        let id = sub.id;

        let (replay, clear_after) = {
            let mut inner = self.lock();
            inner
                .events
                .entry(Arc::clone(&name))
                .or_default()
                .push(sub.clone());

            if inner.options.enable_cache {
                (
                    inner.cache.snapshot(&name),
                    inner.options.clear_cache_after_subscribe,
                )
            } else {
                (Vec::new(), false)
            }
        };

        if !replay.is_empty() {
            for cached in &replay {
                self.invoke(&name, &sub, &cached.payload);
                if sub.once {
                    // One-shot subscribers consume a single cached entry.
                    self.off(&name, id);
                    break;
                }
            }
            if clear_after {
                self.lock().cache.remove(&name);
            }
        }
        id
    }

    /// Runs one callback with panic isolation. No lock may be held here.
    fn invoke(&self, name: &str, sub: &Subscriber<P>, payload: &P) {
        let cb = &sub.callback;
        if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| cb(payload))) {
            eprintln!("[lazybus] subscriber callback for '{name}' panicked: {panic_err:?}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<P>> {
        // Callbacks never run under the lock, so poisoning is unreachable in
        // practice; recover instead of propagating an unusable error.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P> Default for EventBus<P>
where
    P: Clone + 'static,
{
    fn default() -> Self {
        Self::new(BusOptions::default())
    }
}

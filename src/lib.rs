//! # lazybus
//!
//! **Lazybus** bundles two small, independent building blocks for host UI
//! runtimes: an [`EventBus`] with a bounded replay cache, and a [`LazyLoad`]er
//! that resolves element resources when an intersection collaborator reports
//! them near the viewport. The two share no runtime state; use either alone.
//!
//! ## Architecture
//! ### Event bus
//! ```text
//!   emit("msg", payload)
//!        │
//!        ├─ subscribers ───► snapshot ──► cb1 ─► cb2 ─► ...   (registration order,
//!        │                                                     panics isolated,
//!        │                                                     one-shots removed)
//!        └─ nobody yet ────► ReplayCache["msg"]                (FIFO, bounded)
//!
//!   on("msg", cb) ──► register ──► replay ReplayCache["msg"] ──► cache cleared
//!                                  (synchronously, oldest first)
//! ```
//!
//! ### Lazy loader
//! ```text
//!   observe(el) ───────────────► watch map (Unbound → Watching)
//!                                      │
//!   Observe impl ─► handle_entries ─► [bounded queue] ─► worker
//!                                                          │
//!                                          Element::load(pending source)
//!                                            ├─ Ok  ─► source assigned
//!                                            └─ Err ─► fallback substituted
//!                                                          │
//!                                         marker cleared, unobserved (Resolved)
//! ```
//!
//! ## Features
//! | Area           | Description                                                   | Key types / traits                     |
//! |----------------|---------------------------------------------------------------|----------------------------------------|
//! | **Event bus**  | Named publish/subscribe with replay of missed emissions.      | [`EventBus`], [`SubscriptionId`]       |
//! | **Caching**    | Bounded per-event FIFO of undelivered payloads.               | [`BusOptions`], [`CachedEmission`]     |
//! | **Lazy load**  | Watch elements, one load attempt per intersection.            | [`LazyLoad`], [`LazyLoadBuilder`]      |
//! | **Host seams** | Traits the host implements around its own element/observer.   | [`Element`], [`Observe`]               |
//! | **Errors**     | Typed errors for loader misuse and host load failures.        | [`LazyError`], [`LoadError`]           |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use lazybus::{BusOptions, EventBus};
//!
//! // One payload type per bus; hosts with mixed events use an enum.
//! let bus: Arc<EventBus<u32>> = EventBus::shared(BusOptions::default());
//!
//! // Emitted before any subscriber exists: kept in the replay cache.
//! bus.emit("ready", 1);
//!
//! let seen = Arc::new(AtomicU32::new(0));
//! let sink = Arc::clone(&seen);
//! let id = bus.on("ready", move |v| sink.store(*v, Ordering::SeqCst));
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 1); // replayed inside `on`
//! bus.off("ready", id);
//! ```

mod bus;
mod error;
mod lazy;

// ---- Public re-exports ----

pub use bus::{BusOptions, CachedEmission, EventBus, ReplayCache, Subscriber, SubscriptionId};
pub use error::{LazyError, LoadError};
pub use lazy::{
    Element, ElementId, ElementRef, ElementState, ImageOptions, IntersectionEntry, LazyLoad,
    LazyLoadBuilder, NullObserve, Observe, ObserveOptions, ObserveRef,
};

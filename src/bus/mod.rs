//! Named-event publish/subscribe with a bounded replay cache.
//!
//! This module groups the event bus **data model** and the bus itself:
//!
//! ## Contents
//! - [`EventBus`] subscriber registry, emit dispatch, and cache replay
//! - [`ReplayCache`], [`CachedEmission`] bounded per-event FIFO of undelivered payloads
//! - [`Subscriber`], [`SubscriptionId`] callback handle with one-shot flag
//! - [`BusOptions`] caching configuration
//!
//! ## Quick reference
//! - **Emit with subscribers**: snapshot the list, invoke in registration order,
//!   drop one-shot subscribers after firing.
//! - **Emit without subscribers**: append to the replay cache (when enabled),
//!   evicting oldest beyond [`BusOptions::max_cache_size`].
//! - **Subscribe**: register, then replay the name's cached emissions
//!   synchronously before `on` returns.

mod cache;
mod event_bus;
mod options;
mod subscriber;

pub use event_bus::EventBus;
pub use cache::{CachedEmission, ReplayCache};
pub use options::BusOptions;
pub use subscriber::{Subscriber, SubscriptionId};

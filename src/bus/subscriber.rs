//! # Subscriber handle: callback plus one-shot flag.
//!
//! A [`Subscriber`] is owned by the bus and removed on unsubscribe, or after
//! firing once when the one-shot flag is set. Each subscriber carries a
//! globally unique [`SubscriptionId`] drawn from an atomic counter; the id is
//! what [`EventBus::off`](crate::EventBus::off) matches on, since closures
//! have no usable identity of their own.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global counter for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque handle identifying one subscription on one event name.
///
/// Returned by [`EventBus::on`](crate::EventBus::on) and
/// [`EventBus::once`](crate::EventBus::once); pass it back to
/// [`EventBus::off`](crate::EventBus::off) to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates the next globally unique id.
    pub(crate) fn next() -> Self {
        Self(SUBSCRIPTION_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// Shared callback handle invoked with a borrowed payload.
pub type CallbackRef<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// A registered subscriber for one event name.
pub struct Subscriber<P: 'static> {
    /// Identity used by `off` and one-shot removal.
    pub id: SubscriptionId,
    /// User callback; panics are caught and logged by the bus.
    pub callback: CallbackRef<P>,
    /// When true, the subscriber is removed immediately after its first delivery.
    pub once: bool,
}

impl<P: 'static> Subscriber<P> {
    /// Wraps a callback into a subscriber with a fresh id.
    pub(crate) fn new<F>(callback: F, once: bool) -> Self
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        Self {
            id: SubscriptionId::next(),
            callback: Arc::new(callback),
            once,
        }
    }
}

impl<P: 'static> Clone for Subscriber<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
            once: self.once,
        }
    }
}

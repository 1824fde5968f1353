//! # Intersection-reporting collaborator contract.
//!
//! The loader does not know how visibility is detected; it delegates to an
//! [`Observe`] implementation (a browser `IntersectionObserver` binding, a
//! scroll-position poller, a test double). The collaborator is told which
//! element ids to track, and it reports [`IntersectionEntry`] batches back
//! through [`LazyLoad::handle_entries`](crate::LazyLoad::handle_entries).
//!
//! ## Wiring
//! ```text
//! LazyLoad ── observe(id) / unobserve(id) / disconnect() ──► Observe impl
//!     ▲                                                          │
//!     └────────── handle_entries(Vec<IntersectionEntry>) ◄───────┘
//! ```

use std::sync::Arc;

use super::element::ElementId;
use super::options::ObserveOptions;

/// One visibility report for one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntersectionEntry {
    /// Element the report is about.
    pub target: ElementId,
    /// Whether the element currently intersects the viewport region.
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    /// Report that `target` entered the viewport region.
    #[inline]
    pub fn intersecting(target: ElementId) -> Self {
        Self {
            target,
            is_intersecting: true,
        }
    }

    /// Report that `target` is outside the viewport region.
    #[inline]
    pub fn hidden(target: ElementId) -> Self {
        Self {
            target,
            is_intersecting: false,
        }
    }
}

/// # Contract for the intersection collaborator.
///
/// Calls are made from whichever thread drives the loader API; implementations
/// must be cheap and non-blocking. `observe`/`unobserve` may be called with
/// ids the collaborator already tracks (or never saw) and must treat that as
/// a no-op.
pub trait Observe: Send + Sync + 'static {
    /// Receives the observation settings once, when the loader is built.
    fn connect(&self, options: &ObserveOptions) {
        let _ = options;
    }

    /// Starts tracking an element.
    fn observe(&self, id: ElementId);

    /// Stops tracking an element.
    fn unobserve(&self, id: ElementId);

    /// Stops tracking everything; the loader is being destroyed.
    fn disconnect(&self);
}

/// Shared collaborator handle.
pub type ObserveRef = Arc<dyn Observe>;

/// Collaborator that tracks nothing.
///
/// Default when no collaborator is configured. Useful for hosts that feed
/// [`IntersectionEntry`] batches straight into
/// [`LazyLoad::handle_entries`](crate::LazyLoad::handle_entries) and need no
/// observe/unobserve bookkeeping on the other side.
pub struct NullObserve;

impl Observe for NullObserve {
    fn observe(&self, _id: ElementId) {}
    fn unobserve(&self, _id: ElementId) {}
    fn disconnect(&self) {}
}

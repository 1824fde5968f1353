//! # Element contract and lifecycle states.
//!
//! The loader never touches a real UI tree; it works against the [`Element`]
//! trait, which the host implements over its own node/widget handle. The
//! common handle type is [`ElementRef`], an `Arc<dyn Element>` suitable for
//! sharing between the caller and the loader's worker.
//!
//! An element moves through an explicit lifecycle tracked by the loader:
//! `Unbound → Watching → Resolved` (see [`ElementState`]). Transitions are
//! triggered by the public [`LazyLoad`](crate::LazyLoad) API and by
//! intersection reports from the collaborator.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LoadError;

/// Host-assigned identity of an element.
///
/// The loader uses the id for its watch map and for talking to the
/// intersection collaborator; it attaches no meaning to the value itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// Lifecycle state of an element as tracked by the loader.
///
/// - `Unbound`: not in the watch map (never observed, or unobserved again)
/// - `Watching`: observed at the collaborator, waiting for an intersection
/// - `Resolved`: a load attempt finished (success or failure); no longer observed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementState {
    Unbound,
    Watching,
    Resolved,
}

/// # Host-side element handle.
///
/// Implementations wrap whatever the host environment calls an element (a DOM
/// node, a widget, a test double) and expose the small surface the loader
/// needs: the pending-source marker, source assignment, and the actual load.
///
/// # Example
/// ```
/// use std::sync::Mutex;
/// use async_trait::async_trait;
/// use lazybus::{Element, ElementId, LoadError};
///
/// struct Img {
///     id: ElementId,
///     pending: Mutex<Option<String>>,
///     src: Mutex<Option<String>>,
/// }
///
/// #[async_trait]
/// impl Element for Img {
///     fn id(&self) -> ElementId { self.id }
///     fn pending_source(&self) -> Option<String> { self.pending.lock().unwrap().clone() }
///     fn set_pending_source(&self, src: &str) { *self.pending.lock().unwrap() = Some(src.into()); }
///     fn clear_pending_source(&self) { *self.pending.lock().unwrap() = None; }
///     fn set_source(&self, src: &str) { *self.src.lock().unwrap() = Some(src.into()); }
///
///     async fn load(&self, src: &str) -> Result<(), LoadError> {
///         // Assign the real source and await the host's load outcome here.
///         self.set_source(src);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Element: Send + Sync + 'static {
    /// Returns the stable identity of this element.
    fn id(&self) -> ElementId;

    /// Reads the pending-source marker, if present.
    ///
    /// The marker holds the not-yet-loaded resource URL. Elements without a
    /// marker are never watched.
    fn pending_source(&self) -> Option<String>;

    /// Writes the pending-source marker (directive bind/update path).
    fn set_pending_source(&self, src: &str);

    /// Removes the pending-source marker.
    fn clear_pending_source(&self);

    /// Assigns a source directly, without a load attempt.
    ///
    /// Used for the `loading` placeholder and the `error` fallback.
    fn set_source(&self, src: &str);

    /// Assigns the real source and resolves with the host's load outcome.
    ///
    /// This is the success/failure signal from the host environment: the
    /// implementation should assign `src`, then resolve `Ok` once the resource
    /// is usable or `Err` once the host reports failure. The loader makes
    /// exactly one call per intersection; on `Err` it substitutes the
    /// configured fallback and never retries.
    async fn load(&self, src: &str) -> Result<(), LoadError>;
}

/// Shared element handle used across the loader.
pub type ElementRef = Arc<dyn Element>;

//! # Lazy loader configuration.
//!
//! Two option groups, mirroring the two collaborators involved:
//! - [`ImageOptions`] resource-side settings (placeholder, fallback)
//! - [`ObserveOptions`] observation-side settings, handed to the
//!   [`Observe`](crate::Observe) collaborator at build time
//!
//! ## Sentinel values
//! - `queue_capacity` has a minimum of 1 (clamped by the loader).

/// Resource-side options.
///
/// ## Field semantics
/// - `loading`: placeholder source assigned while an element waits for its
///   intersection (`None` = leave the element as-is)
/// - `error`: fallback source substituted when a load fails (`None` = keep
///   whatever the failed load left behind)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageOptions {
    /// Placeholder resource shown until the real source loads.
    pub loading: Option<String>,
    /// Fallback resource substituted on load failure.
    pub error: Option<String>,
}

/// Observation-side options, forwarded to [`Observe::connect`](crate::Observe::connect).
///
/// ## Field semantics
/// - `threshold`: fraction of the element that must be visible to count as
///   intersecting
/// - `root_margin`: margin grown around the viewport region, in the host's
///   own units
/// - `queue_capacity`: bound of the intersection entry queue between
///   [`handle_entries`](crate::LazyLoad::handle_entries) and the worker;
///   entries beyond it are dropped with a warning
#[derive(Clone, Debug, PartialEq)]
pub struct ObserveOptions {
    /// Visible fraction required to report an intersection.
    pub threshold: f64,
    /// Margin around the viewport region (host units, e.g. `"10px"`).
    pub root_margin: String,
    /// Capacity of the intersection entry queue (min 1; clamped).
    pub queue_capacity: usize,
}

impl ObserveOptions {
    /// Returns the entry queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for ObserveOptions {
    /// Default configuration:
    ///
    /// - `threshold = 0.1` (10% visible)
    /// - `root_margin = "10px"`
    /// - `queue_capacity = 1024`
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "10px".to_string(),
            queue_capacity: 1024,
        }
    }
}

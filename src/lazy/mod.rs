//! Lazy resource loading driven by an intersection-reporting collaborator.
//!
//! This module contains the lazy-loader half of the crate. The loader watches
//! opaque element handles and resolves each one exactly once: when the
//! collaborator reports the element as intersecting, the pending source is
//! loaded, the outcome is handled (fallback on failure), and the element is
//! unwatched.
//!
//! ## Contents
//! - [`LazyLoad`], [`LazyLoadBuilder`] the loader and its construction
//! - [`Element`], [`ElementRef`], [`ElementId`], [`ElementState`] host-side element contract and lifecycle
//! - [`Observe`], [`ObserveRef`], [`IntersectionEntry`] collaborator contract and its reports
//! - [`ImageOptions`], [`ObserveOptions`] placeholder/fallback and observation settings
//!
//! ## Element lifecycle
//! ```text
//! Unbound ──observe()──► Watching ──intersection + load──► Resolved
//!    ▲                      │                                  │
//!    └──────unobserve()─────┘            update() re-watches ──┘
//! ```

mod element;
mod loader;
mod observer;
mod options;

pub use element::{Element, ElementId, ElementRef, ElementState};
pub use loader::{LazyLoad, LazyLoadBuilder};
pub use observer::{IntersectionEntry, NullObserve, Observe, ObserveRef};
pub use options::{ImageOptions, ObserveOptions};

//! Error types used by the lazy loader and host-side resource loading.
//!
//! This module defines two error enums:
//!
//! - [`LazyError`] — configuration/usage errors raised by the [`LazyLoad`](crate::LazyLoad) API.
//! - [`LoadError`] — failures reported by the host environment while loading a resource.
//!
//! Both types provide `as_label` helpers for logging/metrics. Note that a resource
//! load failure is recovered locally (fallback substitution) and is never surfaced
//! through the public loader API; [`LoadError`] only crosses the
//! [`Element::load`](crate::Element::load) boundary.

use thiserror::Error;

/// # Errors produced by the lazy loader API.
///
/// These represent caller mistakes detected at call time, not resource
/// failures (those are handled internally with the configured fallback).
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LazyError {
    /// `use_elements` was called with an empty element set.
    #[error("no elements provided")]
    NoElements,

    /// The loader was destroyed; watching new elements is no longer possible.
    #[error("loader already destroyed")]
    Destroyed,
}

impl LazyError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lazybus::LazyError;
    ///
    /// assert_eq!(LazyError::NoElements.as_label(), "lazy_no_elements");
    /// assert_eq!(LazyError::Destroyed.as_label(), "lazy_destroyed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LazyError::NoElements => "lazy_no_elements",
            LazyError::Destroyed => "lazy_destroyed",
        }
    }
}

/// # Resource load failure reported by the host environment.
///
/// Returned by [`Element::load`](crate::Element::load) when assigning the real
/// source did not produce a usable resource (network error, decode error, ...).
/// The loader reacts by substituting the configured fallback source; the error
/// never propagates further.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoadError {
    /// The resource could not be loaded.
    #[error("resource load failed: {reason}")]
    Failed {
        /// Host-provided failure description.
        reason: String,
    },
}

impl LoadError {
    /// Creates a [`LoadError::Failed`] from any displayable reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        LoadError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::Failed { .. } => "load_failed",
        }
    }
}

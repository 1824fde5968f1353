//! # LazyLoad: watch elements, resolve each one exactly once.
//!
//! [`LazyLoad`] owns the watch map and drives the element lifecycle. Elements
//! enter via [`LazyLoad::observe`] (or the batch/directive helpers), wait as
//! `Watching`, and leave as `Resolved` once an intersection report triggered
//! their single load attempt.
//!
//! ## Architecture
//! ```text
//! Inputs:
//!   observe(el) / use_elements(els) / bind+update+unbind  ──► watch map
//!                                                              (ElementId → state)
//! Intersection path:
//!   Observe impl ──► handle_entries() ──► bounded mpsc queue ──► worker task
//!                                                                  │
//!                             per intersecting entry:              ▼
//!                               - must be Watching                process_entry()
//!                               - read pending source
//!                               - Element::load(src)   (panic-isolated)
//!                               -   on Err/panic: substitute fallback
//!                               - clear marker, unobserve, state = Resolved
//!
//! Shutdown path:
//!   destroy() ──► cancel worker ──► Observe::disconnect() ──► watch map cleared
//! ```
//!
//! ## Rules
//! - One worker drains the queue, so callbacks for the same element never
//!   overlap and entries resolve in arrival order.
//! - One load attempt per intersection; failures are recovered locally with
//!   the configured fallback and never surface to the caller.
//! - `destroy` is terminal: later `observe` calls fail with
//!   [`LazyError::Destroyed`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::LazyError;

use super::element::{ElementId, ElementRef, ElementState};
use super::observer::{IntersectionEntry, NullObserve, Observe, ObserveRef};
use super::options::{ImageOptions, ObserveOptions};

/// Watch map entry.
struct Watched {
    el: ElementRef,
    state: ElementState,
}

/// Lazy loader over host elements and an intersection collaborator.
///
/// Build with [`LazyLoad::builder`]; the loader is returned as an `Arc` handle
/// so the host can share it between its directive hooks and the collaborator
/// wiring.
///
/// ## Example
/// ```no_run
/// use std::sync::Arc;
/// use lazybus::{ImageOptions, LazyLoad};
///
/// # fn collaborator() -> lazybus::ObserveRef { Arc::new(lazybus::NullObserve) }
/// # fn elements() -> Vec<lazybus::ElementRef> { Vec::new() }
/// # async fn demo() -> Result<(), lazybus::LazyError> {
/// let lazy = LazyLoad::builder()
///     .with_image_options(ImageOptions {
///         loading: Some("placeholder.png".into()),
///         error: Some("broken.png".into()),
///     })
///     .with_observer(collaborator())
///     .build();
///
/// lazy.use_elements(elements())?;
/// // ... the collaborator reports visibility:
/// // lazy.handle_entries(vec![lazybus::IntersectionEntry::intersecting(id)]);
/// # Ok(())
/// # }
/// ```
pub struct LazyLoad {
    images: ImageOptions,
    observer: ObserveRef,
    watched: Mutex<HashMap<ElementId, Watched>>,
    entry_tx: mpsc::Sender<IntersectionEntry>,
    cancel: CancellationToken,
    destroyed: AtomicBool,
}

/// Builder for constructing a [`LazyLoad`] instance.
pub struct LazyLoadBuilder {
    images: ImageOptions,
    observing: ObserveOptions,
    observer: Option<ObserveRef>,
}

impl LazyLoadBuilder {
    /// Creates a builder with default options and no collaborator.
    pub fn new() -> Self {
        Self {
            images: ImageOptions::default(),
            observing: ObserveOptions::default(),
            observer: None,
        }
    }

    /// Sets placeholder/fallback resources.
    pub fn with_image_options(mut self, images: ImageOptions) -> Self {
        self.images = images;
        self
    }

    /// Sets observation settings (threshold, margin, queue capacity).
    pub fn with_observe_options(mut self, observing: ObserveOptions) -> Self {
        self.observing = observing;
        self
    }

    /// Sets the intersection collaborator.
    ///
    /// Without one, [`NullObserve`] is used and the host is expected to feed
    /// [`LazyLoad::handle_entries`] directly.
    pub fn with_observer(mut self, observer: ObserveRef) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Builds the loader and spawns its entry worker.
    ///
    /// Hands the observation settings to the collaborator via
    /// [`Observe::connect`]. Must be called within a tokio runtime.
    pub fn build(self) -> Arc<LazyLoad> {
        let observer = self.observer.unwrap_or_else(|| Arc::new(NullObserve));
        observer.connect(&self.observing);

        let (entry_tx, entry_rx) =
            mpsc::channel::<IntersectionEntry>(self.observing.queue_capacity_clamped());

        let loader = Arc::new(LazyLoad {
            images: self.images,
            observer,
            watched: Mutex::new(HashMap::new()),
            entry_tx,
            cancel: CancellationToken::new(),
            destroyed: AtomicBool::new(false),
        });

        Arc::clone(&loader).spawn_worker(entry_rx);
        loader
    }
}

impl Default for LazyLoadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyLoad {
    /// Returns a builder.
    pub fn builder() -> LazyLoadBuilder {
        LazyLoadBuilder::new()
    }

    /// Begins watching an element.
    ///
    /// Watching starts only when the element carries a pending-source marker;
    /// elements without one are silently skipped and never enter the watch
    /// map. An element already `Watching` stays watched once (no duplicate
    /// observation); a `Resolved` element re-enters `Watching` (directive
    /// update path).
    ///
    /// # Errors
    /// [`LazyError::Destroyed`] after [`LazyLoad::destroy`].
    pub fn observe(&self, el: ElementRef) -> Result<(), LazyError> {
        self.ensure_alive()?;
        if el.pending_source().is_none() {
            return Ok(());
        }

        let id = el.id();
        let started = {
            let mut watched = self.lock();
            match watched.get_mut(&id) {
                Some(w) if w.state == ElementState::Watching => false,
                Some(w) => {
                    w.el = Arc::clone(&el);
                    w.state = ElementState::Watching;
                    true
                }
                None => {
                    watched.insert(
                        id,
                        Watched {
                            el,
                            state: ElementState::Watching,
                        },
                    );
                    true
                }
            }
        };

        if started {
            self.observer.observe(id);
        }
        Ok(())
    }

    /// Stops watching an element and drops it from the watch map.
    ///
    /// No-op for unwatched ids. The collaborator is only notified when the
    /// element was actually `Watching`.
    pub fn unobserve(&self, id: ElementId) {
        let was_watching = {
            let mut watched = self.lock();
            matches!(
                watched.remove(&id),
                Some(Watched {
                    state: ElementState::Watching,
                    ..
                })
            )
        };

        if was_watching {
            self.observer.unobserve(id);
        }
    }

    /// Batch path: applies the `loading` placeholder and watches each element.
    ///
    /// # Errors
    /// - [`LazyError::NoElements`] when `els` is empty (configuration error at
    ///   call time).
    /// - [`LazyError::Destroyed`] after [`LazyLoad::destroy`].
    pub fn use_elements(&self, els: Vec<ElementRef>) -> Result<(), LazyError> {
        if els.is_empty() {
            return Err(LazyError::NoElements);
        }
        self.ensure_alive()?;

        for el in els {
            if let Some(placeholder) = &self.images.loading {
                el.set_source(placeholder);
            }
            self.observe(el)?;
        }
        Ok(())
    }

    /// Directive bind hook: writes the pending-source marker and placeholder.
    ///
    /// The element is not watched yet; call [`LazyLoad::mount`] once it is in
    /// the host tree.
    pub fn bind(&self, el: &ElementRef, src: &str) -> Result<(), LazyError> {
        self.ensure_alive()?;
        el.set_pending_source(src);
        if let Some(placeholder) = &self.images.loading {
            el.set_source(placeholder);
        }
        Ok(())
    }

    /// Directive mount hook: begins watching a bound element.
    pub fn mount(&self, el: ElementRef) -> Result<(), LazyError> {
        self.observe(el)
    }

    /// Directive update hook: rewrites the marker and re-watches.
    ///
    /// A `Resolved` element transitions back to `Watching`, so a changed
    /// source loads lazily again.
    pub fn update(&self, el: ElementRef, src: &str) -> Result<(), LazyError> {
        self.ensure_alive()?;
        el.set_pending_source(src);
        self.observe(el)
    }

    /// Directive unbind hook: stops watching the element.
    pub fn unbind(&self, el: &ElementRef) {
        self.unobserve(el.id());
    }

    /// Enqueues intersection reports for the worker (non-blocking).
    ///
    /// This is the entry point the collaborator calls with its observation
    /// batches. When the queue is full or the worker is gone, the entry is
    /// dropped and a warning is logged.
    pub fn handle_entries(&self, entries: impl IntoIterator<Item = IntersectionEntry>) {
        for entry in entries {
            match self.entry_tx.try_send(entry) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(e)) => {
                    eprintln!(
                        "[lazybus] dropped intersection entry for {:?}: queue full",
                        e.target
                    );
                }
                Err(mpsc::error::TrySendError::Closed(e)) => {
                    eprintln!(
                        "[lazybus] dropped intersection entry for {:?}: worker closed",
                        e.target
                    );
                }
            }
        }
    }

    /// Stops all watching: cancels the worker, disconnects the collaborator,
    /// clears the watch map. Terminal and idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, AtomicOrdering::SeqCst) {
            return;
        }
        self.cancel.cancel();
        self.observer.disconnect();
        self.lock().clear();
    }

    /// True while `id` is in the `Watching` state.
    pub fn is_watching(&self, id: ElementId) -> bool {
        self.state_of(id) == ElementState::Watching
    }

    /// Number of elements currently `Watching`.
    pub fn watched_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|w| w.state == ElementState::Watching)
            .count()
    }

    /// Lifecycle state of `id`; `Unbound` for ids the loader never saw.
    pub fn state_of(&self, id: ElementId) -> ElementState {
        self.lock()
            .get(&id)
            .map(|w| w.state)
            .unwrap_or(ElementState::Unbound)
    }

    /// Resolves one intersection report.
    ///
    /// Ignores non-intersecting reports and ids that are not `Watching`. An
    /// element whose marker disappeared stays watched (nothing to load yet).
    pub(crate) async fn process_entry(&self, entry: IntersectionEntry) {
        if !entry.is_intersecting {
            return;
        }

        let el = {
            let watched = self.lock();
            match watched.get(&entry.target) {
                Some(w) if w.state == ElementState::Watching => Arc::clone(&w.el),
                _ => return,
            }
        };

        let Some(src) = el.pending_source() else {
            return;
        };

        // Single load attempt; failure and panic both fall back locally.
        match std::panic::AssertUnwindSafe(el.load(&src)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                eprintln!("[lazybus] element {:?} failed to load '{src}': {err}", entry.target);
                if let Some(fallback) = &self.images.error {
                    el.set_source(fallback);
                }
            }
            Err(panic_err) => {
                eprintln!(
                    "[lazybus] element {:?} load panicked: {panic_err:?}",
                    entry.target
                );
                if let Some(fallback) = &self.images.error {
                    el.set_source(fallback);
                }
            }
        }

        el.clear_pending_source();
        {
            let mut watched = self.lock();
            if let Some(w) = watched.get_mut(&entry.target) {
                w.state = ElementState::Resolved;
            }
        }
        self.observer.unobserve(entry.target);
    }

    /// Spawns the worker draining the entry queue. Call once during build.
    fn spawn_worker(self: Arc<Self>, mut rx: mpsc::Receiver<IntersectionEntry>) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    entry = rx.recv() => match entry {
                        Some(e) => self.process_entry(e).await,
                        None => break,
                    }
                }
            }
        });
    }

    fn ensure_alive(&self) -> Result<(), LazyError> {
        if self.destroyed.load(AtomicOrdering::SeqCst) {
            Err(LazyError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ElementId, Watched>> {
        // Host traits are never called under the lock, so poisoning is
        // unreachable in practice; recover instead of erroring out.
        self.watched.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::lazy::element::Element;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct FakeElement {
        id: ElementId,
        pending: Mutex<Option<String>>,
        source: Mutex<Option<String>>,
        loads: AtomicUsize,
        fail: bool,
    }

    impl FakeElement {
        fn arc(id: u64, pending: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                id: ElementId(id),
                pending: Mutex::new(pending.map(String::from)),
                source: Mutex::new(None),
                loads: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing(id: u64, pending: &str) -> Arc<Self> {
            Arc::new(Self {
                id: ElementId(id),
                pending: Mutex::new(Some(pending.to_string())),
                source: Mutex::new(None),
                loads: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn source(&self) -> Option<String> {
            self.source.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Element for FakeElement {
        fn id(&self) -> ElementId {
            self.id
        }
        fn pending_source(&self) -> Option<String> {
            self.pending.lock().unwrap().clone()
        }
        fn set_pending_source(&self, src: &str) {
            *self.pending.lock().unwrap() = Some(src.to_string());
        }
        fn clear_pending_source(&self) {
            *self.pending.lock().unwrap() = None;
        }
        fn set_source(&self, src: &str) {
            *self.source.lock().unwrap() = Some(src.to_string());
        }

        async fn load(&self, src: &str) -> Result<(), LoadError> {
            self.loads.fetch_add(1, AtomicOrdering::SeqCst);
            if self.fail {
                return Err(LoadError::failed("404"));
            }
            self.set_source(src);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingObserve {
        connected: Mutex<Option<ObserveOptions>>,
        observed: Mutex<Vec<ElementId>>,
        unobserved: Mutex<Vec<ElementId>>,
        disconnected: AtomicBool,
    }

    impl Observe for RecordingObserve {
        fn connect(&self, options: &ObserveOptions) {
            *self.connected.lock().unwrap() = Some(options.clone());
        }
        fn observe(&self, id: ElementId) {
            self.observed.lock().unwrap().push(id);
        }
        fn unobserve(&self, id: ElementId) {
            self.unobserved.lock().unwrap().push(id);
        }
        fn disconnect(&self) {
            self.disconnected.store(true, AtomicOrdering::SeqCst);
        }
    }

    fn build_loader(images: ImageOptions) -> (Arc<LazyLoad>, Arc<RecordingObserve>) {
        let observer = Arc::new(RecordingObserve::default());
        let loader = LazyLoad::builder()
            .with_image_options(images)
            .with_observer(Arc::clone(&observer) as ObserveRef)
            .build();
        (loader, observer)
    }

    #[tokio::test]
    async fn test_build_connects_collaborator_with_options() {
        let observer = Arc::new(RecordingObserve::default());
        let opts = ObserveOptions {
            threshold: 0.5,
            root_margin: "20px".to_string(),
            queue_capacity: 8,
        };
        let _loader = LazyLoad::builder()
            .with_observe_options(opts.clone())
            .with_observer(Arc::clone(&observer) as ObserveRef)
            .build();

        assert_eq!(observer.connected.lock().unwrap().as_ref(), Some(&opts));
    }

    #[tokio::test]
    async fn test_element_without_marker_is_never_watched() {
        let (loader, observer) = build_loader(ImageOptions::default());
        let el = FakeElement::arc(1, None);

        loader.observe(el.clone() as ElementRef).unwrap();

        assert_eq!(loader.watched_count(), 0);
        assert_eq!(loader.state_of(ElementId(1)), ElementState::Unbound);
        assert!(observer.observed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_double_observe_watches_once() {
        let (loader, observer) = build_loader(ImageOptions::default());
        let el = FakeElement::arc(1, Some("real.png"));

        loader.observe(el.clone() as ElementRef).unwrap();
        loader.observe(el as ElementRef).unwrap();

        assert_eq!(loader.watched_count(), 1);
        assert_eq!(observer.observed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unobserve_unwatched_is_noop() {
        let (loader, observer) = build_loader(ImageOptions::default());

        loader.unobserve(ElementId(7));

        assert!(observer.unobserved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_intersection_resolves_element() {
        let (loader, observer) = build_loader(ImageOptions::default());
        let el = FakeElement::arc(1, Some("real.png"));
        loader.observe(el.clone() as ElementRef).unwrap();

        loader
            .process_entry(IntersectionEntry::intersecting(ElementId(1)))
            .await;

        assert_eq!(el.source().as_deref(), Some("real.png"));
        assert!(el.pending_source().is_none());
        assert_eq!(loader.state_of(ElementId(1)), ElementState::Resolved);
        assert!(!loader.is_watching(ElementId(1)));
        assert_eq!(*observer.unobserved.lock().unwrap(), vec![ElementId(1)]);
        assert_eq!(el.loads.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_failure_substitutes_fallback() {
        let (loader, _observer) = build_loader(ImageOptions {
            loading: None,
            error: Some("broken.png".to_string()),
        });
        let el = FakeElement::failing(1, "real.png");
        loader.observe(el.clone() as ElementRef).unwrap();

        loader
            .process_entry(IntersectionEntry::intersecting(ElementId(1)))
            .await;

        // Failure recovered locally; element still resolved and unwatched.
        assert_eq!(el.source().as_deref(), Some("broken.png"));
        assert!(el.pending_source().is_none());
        assert_eq!(loader.state_of(ElementId(1)), ElementState::Resolved);
    }

    #[tokio::test]
    async fn test_non_intersecting_entry_is_ignored() {
        let (loader, _observer) = build_loader(ImageOptions::default());
        let el = FakeElement::arc(1, Some("real.png"));
        loader.observe(el.clone() as ElementRef).unwrap();

        loader
            .process_entry(IntersectionEntry::hidden(ElementId(1)))
            .await;

        assert!(loader.is_watching(ElementId(1)));
        assert_eq!(el.loads.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_entry_for_unknown_element_is_ignored() {
        let (loader, observer) = build_loader(ImageOptions::default());

        loader
            .process_entry(IntersectionEntry::intersecting(ElementId(42)))
            .await;

        assert!(observer.unobserved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_use_elements_requires_elements() {
        let (loader, _observer) = build_loader(ImageOptions::default());
        assert_eq!(loader.use_elements(Vec::new()), Err(LazyError::NoElements));
    }

    #[tokio::test]
    async fn test_use_elements_applies_placeholder_and_watches() {
        let (loader, _observer) = build_loader(ImageOptions {
            loading: Some("spinner.gif".to_string()),
            error: None,
        });
        let a = FakeElement::arc(1, Some("a.png"));
        let b = FakeElement::arc(2, Some("b.png"));

        loader
            .use_elements(vec![a.clone() as ElementRef, b.clone() as ElementRef])
            .unwrap();

        assert_eq!(a.source().as_deref(), Some("spinner.gif"));
        assert_eq!(b.source().as_deref(), Some("spinner.gif"));
        assert_eq!(loader.watched_count(), 2);
    }

    #[tokio::test]
    async fn test_directive_lifecycle_bind_mount_update() {
        let (loader, _observer) = build_loader(ImageOptions {
            loading: Some("spinner.gif".to_string()),
            error: None,
        });
        let el = FakeElement::arc(1, None);
        let handle: ElementRef = el.clone();

        loader.bind(&handle, "one.png").unwrap();
        assert_eq!(el.pending_source().as_deref(), Some("one.png"));
        assert_eq!(el.source().as_deref(), Some("spinner.gif"));
        assert_eq!(loader.state_of(ElementId(1)), ElementState::Unbound);

        loader.mount(handle.clone()).unwrap();
        assert!(loader.is_watching(ElementId(1)));

        loader
            .process_entry(IntersectionEntry::intersecting(ElementId(1)))
            .await;
        assert_eq!(loader.state_of(ElementId(1)), ElementState::Resolved);
        assert_eq!(el.source().as_deref(), Some("one.png"));

        // A changed source re-enters the lazy cycle.
        loader.update(handle.clone(), "two.png").unwrap();
        assert!(loader.is_watching(ElementId(1)));

        loader
            .process_entry(IntersectionEntry::intersecting(ElementId(1)))
            .await;
        assert_eq!(el.source().as_deref(), Some("two.png"));

        loader.unbind(&handle);
        assert_eq!(loader.state_of(ElementId(1)), ElementState::Unbound);
    }

    #[tokio::test]
    async fn test_destroy_is_terminal() {
        let (loader, observer) = build_loader(ImageOptions::default());
        let el = FakeElement::arc(1, Some("real.png"));
        loader.observe(el.clone() as ElementRef).unwrap();

        loader.destroy();
        loader.destroy();

        assert!(observer.disconnected.load(AtomicOrdering::SeqCst));
        assert_eq!(loader.watched_count(), 0);
        assert_eq!(
            loader.observe(el as ElementRef),
            Err(LazyError::Destroyed)
        );
    }

    #[tokio::test]
    async fn test_worker_drains_handle_entries() {
        let (loader, _observer) = build_loader(ImageOptions::default());
        let el = FakeElement::arc(1, Some("real.png"));
        loader.observe(el.clone() as ElementRef).unwrap();

        loader.handle_entries(vec![IntersectionEntry::intersecting(ElementId(1))]);

        for _ in 0..100 {
            if loader.state_of(ElementId(1)) == ElementState::Resolved {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(loader.state_of(ElementId(1)), ElementState::Resolved);
        assert_eq!(el.source().as_deref(), Some("real.png"));
    }
}

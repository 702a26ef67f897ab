//! Infinite-scroll trigger
//!
//! Watches a sentinel placed after the last list item and calls `on_load_more`
//! when it scrolls into view. No watcher exists at all while there is nothing
//! more to load or a load is in progress.

use super::observer::{
    IntersectionCallback, IntersectionEntry, IntersectionWatcher, ObserverFactory,
    ObserverOptions, SentinelId,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Default visible fraction that counts as "in view"
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Default root margin, so loading starts slightly before the end is reached
pub const DEFAULT_ROOT_MARGIN: &str = "100px";

/// Callback invoked when more items should be loaded
pub type LoadMoreCallback = Arc<dyn Fn() + Send + Sync>;

/// Inputs of one trigger update
#[derive(Clone)]
pub struct TriggerProps {
    pub has_more: bool,
    pub is_loading: bool,
    pub on_load_more: LoadMoreCallback,
    pub threshold: f64,
    pub root_margin: String,
}

impl TriggerProps {
    /// Props with the default threshold and root margin
    pub fn new(has_more: bool, is_loading: bool, on_load_more: LoadMoreCallback) -> Self {
        Self {
            has_more,
            is_loading,
            on_load_more,
            threshold: DEFAULT_THRESHOLD,
            root_margin: DEFAULT_ROOT_MARGIN.to_string(),
        }
    }

    /// Set the threshold
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the root margin
    #[must_use]
    pub fn root_margin(mut self, root_margin: impl Into<String>) -> Self {
        self.root_margin = root_margin.into();
        self
    }

    fn eligible(&self) -> bool {
        self.has_more && !self.is_loading
    }
}

impl fmt::Debug for TriggerProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerProps")
            .field("has_more", &self.has_more)
            .field("is_loading", &self.is_loading)
            .field("threshold", &self.threshold)
            .field("root_margin", &self.root_margin)
            .finish_non_exhaustive()
    }
}

/// Attachable reference to the sentinel node
///
/// The host attaches the node id once the sentinel is mounted; the trigger
/// picks it up on its next update.
#[derive(Debug, Clone, Default)]
pub struct SentinelRef(Arc<Mutex<Option<SentinelId>>>);

impl SentinelRef {
    /// Attach a sentinel node
    pub fn attach(&self, id: SentinelId) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    /// Detach the sentinel node
    pub fn detach(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Currently attached node
    pub fn get(&self) -> Option<SentinelId> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Values the current watcher was built from
struct AppliedProps {
    props: TriggerProps,
    sentinel: Option<SentinelId>,
}

impl AppliedProps {
    fn matches(&self, props: &TriggerProps, sentinel: Option<SentinelId>) -> bool {
        self.sentinel == sentinel
            && self.props.has_more == props.has_more
            && self.props.is_loading == props.is_loading
            && Arc::ptr_eq(&self.props.on_load_more, &props.on_load_more)
            && self.props.threshold.to_bits() == props.threshold.to_bits()
            && self.props.root_margin == props.root_margin
    }
}

/// Fires `on_load_more` on each transition of `target` into view
fn on_enter(target: SentinelId, on_load_more: LoadMoreCallback) -> IntersectionCallback {
    let was_intersecting = AtomicBool::new(false);
    Arc::new(move |entries: &[IntersectionEntry]| {
        for entry in entries.iter().filter(|e| e.target == target) {
            let before = was_intersecting.swap(entry.is_intersecting, Ordering::SeqCst);
            if entry.is_intersecting && !before {
                debug!(%target, ratio = entry.intersection_ratio, "sentinel entered view");
                on_load_more();
            }
        }
    })
}

/// Infinite-scroll trigger over a host [`ObserverFactory`]
pub struct InfiniteScrollTrigger<F: ObserverFactory> {
    factory: F,
    sentinel: SentinelRef,
    applied: Option<AppliedProps>,
    watcher: Option<(SentinelId, Box<dyn IntersectionWatcher>)>,
}

impl<F: ObserverFactory> InfiniteScrollTrigger<F> {
    /// Create a trigger; nothing is observed until the first update
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            sentinel: SentinelRef::default(),
            applied: None,
            watcher: None,
        }
    }

    /// Reference the host attaches the sentinel node to
    pub fn sentinel_ref(&self) -> SentinelRef {
        self.sentinel.clone()
    }

    /// Whether a watcher is currently live
    pub fn is_observing(&self) -> bool {
        self.watcher.is_some()
    }

    /// Apply new props
    ///
    /// When any prop (or the attached sentinel) differs from the last update,
    /// the existing watcher is torn down and, if still eligible, a new one is
    /// created so the callback it holds is always the current one.
    pub fn update(&mut self, props: TriggerProps) {
        let sentinel = self.sentinel.get();
        if self
            .applied
            .as_ref()
            .is_some_and(|applied| applied.matches(&props, sentinel))
        {
            return;
        }

        self.teardown();

        if let (true, Some(target)) = (props.eligible(), sentinel) {
            match ObserverOptions::new(props.threshold, &props.root_margin) {
                Ok(options) => {
                    let callback = on_enter(target, Arc::clone(&props.on_load_more));
                    let mut watcher = self.factory.create(&options, callback);
                    watcher.observe(target);
                    debug!(%target, ?options, "observing sentinel");
                    self.watcher = Some((target, watcher));
                }
                Err(e) => warn!(error = %e, "not observing sentinel"),
            }
        }

        self.applied = Some(AppliedProps { props, sentinel });
    }

    fn teardown(&mut self) {
        if let Some((target, mut watcher)) = self.watcher.take() {
            watcher.unobserve(target);
            watcher.disconnect();
            debug!(%target, "stopped observing sentinel");
        }
    }
}

impl<F: ObserverFactory> Drop for InfiniteScrollTrigger<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<F: ObserverFactory> fmt::Debug for InfiniteScrollTrigger<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfiniteScrollTrigger")
            .field("sentinel", &self.sentinel.get())
            .field("observing", &self.is_observing())
            .field("props", &self.applied.as_ref().map(|a| &a.props))
            .finish()
    }
}

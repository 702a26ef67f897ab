//! Headless vertical viewport
//!
//! An [`ObserverFactory`] for environments without a native intersection
//! primitive: terminal UIs, simulations and tests. Sentinels are vertical
//! spans in content coordinates; the root is the visible window
//! `[scroll_top, scroll_top + height]` grown by each watcher's root margin.
//!
//! Like a browser observer, a watcher reports every target once when it starts
//! observing it, then again whenever the target crosses the threshold.

use super::observer::{
    IntersectionCallback, IntersectionEntry, IntersectionWatcher, ObserverFactory,
    ObserverOptions, SentinelId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// A vertical span in content coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub top: f64,
    pub height: f64,
}

impl Span {
    /// Create a span
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

struct Watcher {
    options: ObserverOptions,
    callback: IntersectionCallback,
    /// Last reported state per target; `None` until the first report
    targets: BTreeMap<SentinelId, Option<bool>>,
}

#[derive(Default)]
struct State {
    scroll_top: f64,
    height: f64,
    sentinels: HashMap<SentinelId, Span>,
    watchers: BTreeMap<u64, Watcher>,
    next_sentinel: u64,
    next_watcher: u64,
}

impl State {
    fn entry_for(&self, options: &ObserverOptions, target: SentinelId) -> IntersectionEntry {
        let Some(span) = self.sentinels.get(&target) else {
            return IntersectionEntry::hidden(target);
        };

        let margin = &options.root_margin;
        let root_top = self.scroll_top - margin.top.resolve(self.height);
        let root_bottom = self.scroll_top + self.height + margin.bottom.resolve(self.height);

        let overlap = span.bottom().min(root_bottom) - span.top.max(root_top);
        let touching = overlap >= 0.0;
        let ratio = if span.height > 0.0 {
            (overlap.max(0.0) / span.height).min(1.0)
        } else if touching {
            1.0
        } else {
            0.0
        };

        IntersectionEntry {
            target,
            is_intersecting: touching && ratio >= options.threshold,
            intersection_ratio: ratio,
        }
    }

    /// Entries that changed since they were last reported, per watcher
    fn collect_changes(&mut self) -> Vec<(IntersectionCallback, Vec<IntersectionEntry>)> {
        let mut deliveries = Vec::new();
        let ids: Vec<u64> = self.watchers.keys().copied().collect();

        for id in ids {
            let Some(watcher) = self.watchers.get(&id) else {
                continue;
            };
            let entries: Vec<IntersectionEntry> = watcher
                .targets
                .iter()
                .map(|(target, last)| (self.entry_for(&watcher.options, *target), *last))
                .filter(|(entry, last)| *last != Some(entry.is_intersecting))
                .map(|(entry, _)| entry)
                .collect();

            if entries.is_empty() {
                continue;
            }
            if let Some(watcher) = self.watchers.get_mut(&id) {
                for entry in &entries {
                    watcher
                        .targets
                        .insert(entry.target, Some(entry.is_intersecting));
                }
                deliveries.push((Arc::clone(&watcher.callback), entries));
            }
        }
        deliveries
    }
}

type Shared = Arc<Mutex<State>>;

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Recompute intersections and deliver changes outside the lock
fn notify(state: &Mutex<State>) {
    let deliveries = lock(state).collect_changes();
    for (callback, entries) in deliveries {
        callback(&entries);
    }
}

/// Headless viewport implementing [`ObserverFactory`]
#[derive(Clone, Default)]
pub struct VirtualViewport {
    state: Shared,
}

impl VirtualViewport {
    /// Viewport of the given visible height, scrolled to the top
    pub fn new(height: f64) -> Self {
        let viewport = Self::default();
        lock(&viewport.state).height = height.max(0.0);
        viewport
    }

    /// Add a sentinel node occupying `span`
    pub fn add_sentinel(&self, span: Span) -> SentinelId {
        let id = {
            let mut state = lock(&self.state);
            let id = SentinelId(state.next_sentinel);
            state.next_sentinel += 1;
            state.sentinels.insert(id, span);
            id
        };
        notify(&self.state);
        id
    }

    /// Move a sentinel, e.g. after more items were rendered above it
    pub fn move_sentinel(&self, id: SentinelId, span: Span) {
        lock(&self.state).sentinels.insert(id, span);
        notify(&self.state);
    }

    /// Remove a sentinel node
    pub fn remove_sentinel(&self, id: SentinelId) {
        lock(&self.state).sentinels.remove(&id);
        notify(&self.state);
    }

    /// Scroll to an absolute offset (clamped at 0)
    pub fn scroll_to(&self, top: f64) {
        lock(&self.state).scroll_top = top.max(0.0);
        notify(&self.state);
    }

    /// Scroll by a relative amount
    pub fn scroll_by(&self, delta: f64) {
        let top = lock(&self.state).scroll_top + delta;
        self.scroll_to(top);
    }

    /// Change the visible height
    pub fn resize(&self, height: f64) {
        lock(&self.state).height = height.max(0.0);
        notify(&self.state);
    }

    /// Current scroll offset
    pub fn scroll_top(&self) -> f64 {
        lock(&self.state).scroll_top
    }

    /// Number of live watchers
    pub fn watcher_count(&self) -> usize {
        lock(&self.state).watchers.len()
    }
}

impl ObserverFactory for VirtualViewport {
    fn create(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback,
    ) -> Box<dyn IntersectionWatcher> {
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_watcher;
            state.next_watcher += 1;
            state.watchers.insert(
                id,
                Watcher {
                    options: *options,
                    callback,
                    targets: BTreeMap::new(),
                },
            );
            id
        };

        Box::new(VirtualWatcher {
            id,
            state: Arc::downgrade(&self.state),
        })
    }
}

impl std::fmt::Debug for VirtualViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("VirtualViewport")
            .field("scroll_top", &state.scroll_top)
            .field("height", &state.height)
            .field("sentinels", &state.sentinels.len())
            .field("watchers", &state.watchers.len())
            .finish()
    }
}

struct VirtualWatcher {
    id: u64,
    state: Weak<Mutex<State>>,
}

impl IntersectionWatcher for VirtualWatcher {
    fn observe(&mut self, target: SentinelId) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        if let Some(watcher) = lock(&state).watchers.get_mut(&self.id) {
            watcher.targets.entry(target).or_insert(None);
        }
        notify(&state);
    }

    fn unobserve(&mut self, target: SentinelId) {
        if let Some(state) = self.state.upgrade() {
            if let Some(watcher) = lock(&state).watchers.get_mut(&self.id) {
                watcher.targets.remove(&target);
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state).watchers.remove(&self.id);
        }
    }
}

impl Drop for VirtualWatcher {
    fn drop(&mut self) {
        self.disconnect();
    }
}

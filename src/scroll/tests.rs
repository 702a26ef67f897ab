//! Tests for the scroll trigger and the headless viewport

use super::*;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording host
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Create(ObserverOptions),
    Observe(SentinelId),
    Unobserve(SentinelId),
    Disconnect,
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
    callbacks: Mutex<Vec<IntersectionCallback>>,
}

impl Recorder {
    fn log(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn creates(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Create(_)))
            .count()
    }

    /// Deliver entries to the most recently created watcher
    fn fire(&self, entries: &[IntersectionEntry]) {
        let callback = self.callbacks.lock().unwrap().last().cloned().unwrap();
        callback(entries);
    }
}

struct RecordingWatcher(Arc<Recorder>);

impl IntersectionWatcher for RecordingWatcher {
    fn observe(&mut self, target: SentinelId) {
        self.0.log(Event::Observe(target));
    }

    fn unobserve(&mut self, target: SentinelId) {
        self.0.log(Event::Unobserve(target));
    }

    fn disconnect(&mut self) {
        self.0.log(Event::Disconnect);
    }
}

struct RecordingFactory(Arc<Recorder>);

impl ObserverFactory for RecordingFactory {
    fn create(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback,
    ) -> Box<dyn IntersectionWatcher> {
        self.0.log(Event::Create(*options));
        self.0.callbacks.lock().unwrap().push(callback);
        Box::new(RecordingWatcher(Arc::clone(&self.0)))
    }
}

fn counter() -> (Arc<AtomicUsize>, LoadMoreCallback) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let callback: LoadMoreCallback = Arc::new(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (count, callback)
}

fn attached_trigger(recorder: &Arc<Recorder>) -> InfiniteScrollTrigger<RecordingFactory> {
    let trigger = InfiniteScrollTrigger::new(RecordingFactory(Arc::clone(recorder)));
    trigger.sentinel_ref().attach(SentinelId(7));
    trigger
}

// ============================================================================
// Gating
// ============================================================================

#[test]
fn test_no_watcher_without_more_items() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (_, on_load_more) = counter();

    trigger.update(TriggerProps::new(false, false, on_load_more));

    assert_eq!(recorder.creates(), 0);
    assert!(!trigger.is_observing());
}

#[test]
fn test_no_watcher_while_loading() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (_, on_load_more) = counter();

    trigger.update(TriggerProps::new(true, true, on_load_more));

    assert_eq!(recorder.creates(), 0);
}

#[test]
fn test_no_watcher_without_sentinel() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = InfiniteScrollTrigger::new(RecordingFactory(Arc::clone(&recorder)));
    let (_, on_load_more) = counter();

    trigger.update(TriggerProps::new(true, false, Arc::clone(&on_load_more)));
    assert_eq!(recorder.creates(), 0);

    trigger.sentinel_ref().attach(SentinelId(1));
    trigger.update(TriggerProps::new(true, false, on_load_more));
    assert_eq!(recorder.creates(), 1);
    assert_eq!(recorder.events()[1], Event::Observe(SentinelId(1)));
}

#[test]
fn test_default_options() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (_, on_load_more) = counter();

    trigger.update(TriggerProps::new(true, false, on_load_more));

    assert_eq!(
        recorder.events()[0],
        Event::Create(ObserverOptions::new(0.1, "100px").unwrap())
    );
}

#[test]
fn test_invalid_root_margin_does_not_observe() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (_, on_load_more) = counter();

    trigger.update(TriggerProps::new(true, false, on_load_more).root_margin("lots"));

    assert_eq!(recorder.creates(), 0);
    assert!(!trigger.is_observing());
}

// ============================================================================
// Firing
// ============================================================================

#[test]
fn test_fires_once_per_entry_into_view() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (count, on_load_more) = counter();
    trigger.update(TriggerProps::new(true, false, on_load_more));

    let target = SentinelId(7);
    recorder.fire(&[IntersectionEntry::hidden(target)]);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    recorder.fire(&[IntersectionEntry::visible(target)]);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    recorder.fire(&[IntersectionEntry::visible(target)]);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    recorder.fire(&[IntersectionEntry::hidden(target)]);
    recorder.fire(&[IntersectionEntry::visible(target)]);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_ignores_other_targets() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (count, on_load_more) = counter();
    trigger.update(TriggerProps::new(true, false, on_load_more));

    recorder.fire(&[IntersectionEntry::visible(SentinelId(99))]);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Re-creation
// ============================================================================

#[test]
fn test_unchanged_props_keep_watcher() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (_, on_load_more) = counter();

    let props = TriggerProps::new(true, false, on_load_more);
    trigger.update(props.clone());
    trigger.update(props.clone());
    trigger.update(props);

    assert_eq!(recorder.creates(), 1);
}

#[test]
fn test_loading_tears_down_and_recreates() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (_, on_load_more) = counter();

    trigger.update(TriggerProps::new(true, false, Arc::clone(&on_load_more)));
    trigger.update(TriggerProps::new(true, true, Arc::clone(&on_load_more)));
    assert!(!trigger.is_observing());
    trigger.update(TriggerProps::new(true, false, on_load_more));

    let options = ObserverOptions::new(0.1, "100px").unwrap();
    let target = SentinelId(7);
    assert_eq!(
        recorder.events(),
        vec![
            Event::Create(options),
            Event::Observe(target),
            Event::Unobserve(target),
            Event::Disconnect,
            Event::Create(options),
            Event::Observe(target),
        ]
    );
}

#[test]
fn test_new_callback_identity_recreates_watcher() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (old_count, old_callback) = counter();
    let (new_count, new_callback) = counter();

    trigger.update(TriggerProps::new(true, false, old_callback));
    trigger.update(TriggerProps::new(true, false, new_callback));
    assert_eq!(recorder.creates(), 2);

    recorder.fire(&[IntersectionEntry::visible(SentinelId(7))]);
    assert_eq!(old_count.load(Ordering::SeqCst), 0);
    assert_eq!(new_count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_threshold_and_margin_changes_recreate() {
    let recorder = Arc::new(Recorder::default());
    let mut trigger = attached_trigger(&recorder);
    let (_, on_load_more) = counter();
    let props = TriggerProps::new(true, false, on_load_more);

    trigger.update(props.clone());
    trigger.update(props.clone().threshold(0.5));
    trigger.update(props.clone().threshold(0.5).root_margin("0px"));

    assert_eq!(recorder.creates(), 3);
}

#[test]
fn test_drop_disconnects() {
    let recorder = Arc::new(Recorder::default());
    let (_, on_load_more) = counter();
    {
        let mut trigger = attached_trigger(&recorder);
        trigger.update(TriggerProps::new(true, false, on_load_more));
    }

    assert_eq!(recorder.events().last(), Some(&Event::Disconnect));
}

// ============================================================================
// Virtual viewport
// ============================================================================

#[test]
fn test_viewport_reports_initial_state_on_observe() {
    let viewport = VirtualViewport::new(400.0);
    let sentinel = viewport.add_sentinel(Span::new(200.0, 1.0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut watcher = viewport.create(
        &ObserverOptions::new(0.0, "0px").unwrap(),
        Arc::new(move |entries: &[IntersectionEntry]| {
            sink.lock().unwrap().extend_from_slice(entries);
        }),
    );
    watcher.observe(sentinel);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].is_intersecting);
    assert_eq!(seen[0].intersection_ratio, 1.0);
}

#[test]
fn test_viewport_root_margin_expands_root() {
    let viewport = VirtualViewport::new(400.0);
    let sentinel = viewport.add_sentinel(Span::new(1000.0, 10.0));
    let (count, on_load_more) = counter();
    let mut trigger = InfiniteScrollTrigger::new(viewport.clone());
    trigger.sentinel_ref().attach(sentinel);
    trigger.update(TriggerProps::new(true, false, on_load_more));

    // Root bottom is scroll_top + 400 + 100
    viewport.scroll_to(490.0);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // Half a pixel of 10 visible: below the 0.1 threshold
    viewport.scroll_to(500.5);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    viewport.scroll_to(505.0);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    viewport.scroll_by(50.0);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_viewport_percent_margin() {
    let viewport = VirtualViewport::new(400.0);
    let sentinel = viewport.add_sentinel(Span::new(550.0, 0.0));
    let (count, on_load_more) = counter();
    let mut trigger = InfiniteScrollTrigger::new(viewport.clone());
    trigger.sentinel_ref().attach(sentinel);

    // 50% of 400 extends the root to 600
    trigger.update(TriggerProps::new(true, false, on_load_more).root_margin("50%"));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_viewport_refires_after_sentinel_moves() {
    let viewport = VirtualViewport::new(400.0);
    let sentinel = viewport.add_sentinel(Span::new(300.0, 1.0));
    let (count, on_load_more) = counter();
    let mut trigger = InfiniteScrollTrigger::new(viewport.clone());
    trigger.sentinel_ref().attach(sentinel);

    trigger.update(TriggerProps::new(true, false, on_load_more));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // More items rendered, sentinel pushed out of view, then scrolled to again
    viewport.move_sentinel(sentinel, Span::new(2000.0, 1.0));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    viewport.scroll_to(1600.0);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_viewport_watchers_released() {
    let viewport = VirtualViewport::new(400.0);
    let sentinel = viewport.add_sentinel(Span::new(2000.0, 1.0));
    let (_, on_load_more) = counter();
    {
        let mut trigger = InfiniteScrollTrigger::new(viewport.clone());
        trigger.sentinel_ref().attach(sentinel);
        trigger.update(TriggerProps::new(true, false, Arc::clone(&on_load_more)));
        assert_eq!(viewport.watcher_count(), 1);

        trigger.update(TriggerProps::new(false, false, on_load_more));
        assert_eq!(viewport.watcher_count(), 0);

        trigger.update(TriggerProps::new(true, false, Arc::new(|| {})));
        assert_eq!(viewport.watcher_count(), 1);
    }
    assert_eq!(viewport.watcher_count(), 0);
}

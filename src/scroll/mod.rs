//! Scroll module
//!
//! Visibility-driven "load more" triggering.
//!
//! # Overview
//!
//! - `InfiniteScrollTrigger` - observes a sentinel and calls `on_load_more` as it enters view
//! - `ObserverFactory` / `IntersectionWatcher` - the host's intersection primitive
//! - `VirtualViewport` - headless host implementation for terminals and tests

mod observer;
mod trigger;
mod viewport;

pub use observer::{
    IntersectionCallback, IntersectionEntry, IntersectionWatcher, Length, ObserverFactory,
    ObserverOptions, RootMargin, SentinelId,
};
pub use trigger::{
    InfiniteScrollTrigger, LoadMoreCallback, SentinelRef, TriggerProps, DEFAULT_ROOT_MARGIN,
    DEFAULT_THRESHOLD,
};
pub use viewport::{Span, VirtualViewport};

#[cfg(test)]
mod tests;

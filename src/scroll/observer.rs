//! Intersection observation primitives
//!
//! The host environment (a browser binding, a terminal UI, the headless
//! [`super::VirtualViewport`]) implements [`ObserverFactory`]; the trigger
//! only talks to these traits.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

/// Identity of a sentinel node in the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SentinelId(pub u64);

impl fmt::Display for SentinelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sentinel#{}", self.0)
    }
}

/// One visibility change reported by a watcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    /// Observed sentinel
    pub target: SentinelId,
    /// Whether the visible fraction is at or above the threshold
    pub is_intersecting: bool,
    /// Visible fraction of the target, 0.0..=1.0
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    /// Entry for a target that became visible
    pub fn visible(target: SentinelId) -> Self {
        Self {
            target,
            is_intersecting: true,
            intersection_ratio: 1.0,
        }
    }

    /// Entry for a target that left the viewport
    pub fn hidden(target: SentinelId) -> Self {
        Self {
            target,
            is_intersecting: false,
            intersection_ratio: 0.0,
        }
    }
}

/// Callback a watcher delivers batches of entries to
pub type IntersectionCallback = Arc<dyn Fn(&[IntersectionEntry]) + Send + Sync>;

/// A CSS length used in a root margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    /// Absolute pixels
    Px(f64),
    /// Percentage of the root's extent along the same axis
    Percent(f64),
}

impl Length {
    /// Resolve against the root extent
    pub fn resolve(&self, extent: f64) -> f64 {
        match self {
            Self::Px(px) => *px,
            Self::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

static LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?(?:\d+(?:\.\d+)?|\.\d+))(px|%)?$").unwrap());

fn parse_length(token: &str, margin: &str) -> Result<Length> {
    let caps = LENGTH_RE
        .captures(token)
        .ok_or_else(|| Error::root_margin(margin, format!("cannot parse '{token}'")))?;

    let value: f64 = caps[1]
        .parse()
        .map_err(|_| Error::root_margin(margin, format!("bad number in '{token}'")))?;

    match caps.get(2).map(|m| m.as_str()) {
        Some("px") => Ok(Length::Px(value)),
        Some("%") => Ok(Length::Percent(value)),
        _ if value == 0.0 => Ok(Length::Px(0.0)),
        _ => Err(Error::root_margin(
            margin,
            format!("'{token}' needs a px or % unit"),
        )),
    }
}

/// Root margin in CSS shorthand order
///
/// Grows (or with negative values shrinks) the root's box before
/// intersections are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl RootMargin {
    /// Same margin on all sides
    pub fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::uniform(Length::Px(0.0))
    }
}

impl FromStr for RootMargin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split_whitespace()
            .map(|token| parse_length(token, s))
            .collect::<Result<Vec<_>>>()?;

        match parts.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => Err(Error::root_margin(s, "expected 1 to 4 lengths")),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Options a watcher is created with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Visible fraction at which the target counts as intersecting
    pub threshold: f64,
    /// Expansion of the root box
    pub root_margin: RootMargin,
}

impl ObserverOptions {
    /// Validate and build options
    pub fn new(threshold: f64, root_margin: &str) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidThreshold { threshold });
        }
        Ok(Self {
            threshold,
            root_margin: root_margin.parse()?,
        })
    }
}

/// A live intersection watcher
pub trait IntersectionWatcher: Send {
    /// Start watching a target
    fn observe(&mut self, target: SentinelId);

    /// Stop watching a target
    fn unobserve(&mut self, target: SentinelId);

    /// Stop watching everything; the callback is never invoked again
    fn disconnect(&mut self);
}

/// Host primitive that creates watchers
pub trait ObserverFactory {
    /// Create a watcher delivering entries to `callback`
    fn create(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback,
    ) -> Box<dyn IntersectionWatcher>;
}

impl<F: ObserverFactory + ?Sized> ObserverFactory for Arc<F> {
    fn create(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback,
    ) -> Box<dyn IntersectionWatcher> {
        (**self).create(options, callback)
    }
}

//! Pagination types
//!
//! Offset bookkeeping shared between a [`super::PaginatedQuery`] and the
//! load-more handles it gives out.

use crate::error::Error;
use std::fmt;
use std::sync::Arc;

/// Default page size
pub const DEFAULT_LIMIT: u32 = 10;

/// Pulls the item list out of one (merged) page response
pub type ExtractItems<P, T> = Arc<dyn Fn(&P) -> Vec<T> + Send + Sync>;

/// Pulls the total item count out of one page response
pub type ExtractTotal<P> = Arc<dyn Fn(&P) -> u64 + Send + Sync>;

/// Resource-specific "is there another page" rule: `(page, offset, limit)`
pub type HasMorePredicate<P> = Arc<dyn Fn(&P, u32, u32) -> bool + Send + Sync>;

/// Why a `load_more` call did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No response has arrived for the current resource yet
    NoData,
    /// A fetch is in flight, or the advanced window has not been polled yet
    InFlight,
    /// The resource predicate reports no further pages
    Exhausted,
    /// The next window would start at or past the known total
    PastTotal,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoData => "no data yet",
            Self::InFlight => "fetch in flight",
            Self::Exhausted => "no more pages",
            Self::PastTotal => "next offset past total",
        };
        f.write_str(reason)
    }
}

/// Result of a `load_more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    /// The offset moved; the next poll fetches this window
    Advanced {
        /// New offset
        offset: u32,
    },
    /// Nothing changed
    Skipped(SkipReason),
}

impl LoadMoreOutcome {
    /// Check if the offset advanced
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Offset/limit state for one paginated resource instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// Cursor into the result set; always a multiple of `limit`
    pub offset: u32,
    /// Page size
    pub limit: u32,
    /// Total reported by the latest response
    pub total: u64,
    /// Whether any response arrived for the current resource
    pub has_data: bool,
    /// Predicate result for the latest response
    pub has_more: bool,
    /// Whether the source reported a fetch in flight at the last poll
    pub is_fetching: bool,
    /// The offset advanced and no poll has observed the new window yet
    pub awaiting_poll: bool,
}

impl PaginationState {
    /// Create state for a fresh resource
    pub fn new(limit: u32) -> Self {
        Self {
            offset: 0,
            limit,
            total: 0,
            has_data: false,
            has_more: false,
            is_fetching: false,
            awaiting_poll: false,
        }
    }

    /// Forget everything about the current resource
    pub fn reset(&mut self) {
        *self = Self::new(self.limit);
    }

    /// Record what a poll at `offset` saw
    ///
    /// Ignored when the offset moved since the poll read it.
    pub fn observe(&mut self, offset: u32, has_data: bool, total: u64, has_more: bool, is_fetching: bool) {
        if offset != self.offset {
            return;
        }
        self.has_data = has_data;
        self.total = total;
        self.has_more = has_more;
        self.is_fetching = is_fetching;
        self.awaiting_poll = false;
    }

    /// Advance by one page if every guard allows it
    ///
    /// Guards run in order: data present, nothing in flight, predicate true,
    /// next offset below the reported total. The last two are independent,
    /// so a true predicate can still end in [`SkipReason::PastTotal`].
    pub fn try_advance(&mut self) -> LoadMoreOutcome {
        if !self.has_data {
            return LoadMoreOutcome::Skipped(SkipReason::NoData);
        }
        if self.is_fetching || self.awaiting_poll {
            return LoadMoreOutcome::Skipped(SkipReason::InFlight);
        }
        if !self.has_more {
            return LoadMoreOutcome::Skipped(SkipReason::Exhausted);
        }

        let next = self.offset.saturating_add(self.limit);
        if u64::from(next) >= self.total {
            return LoadMoreOutcome::Skipped(SkipReason::PastTotal);
        }

        self.offset = next;
        self.awaiting_poll = true;
        LoadMoreOutcome::Advanced { offset: next }
    }
}

/// Read model produced by one poll
#[derive(Clone)]
pub struct PaginatedView<T> {
    /// Items of the latest (merged) response
    pub items: Vec<T>,
    /// Total reported by the latest response, 0 without data
    pub total: u64,
    /// Predicate result, false without data
    ///
    /// This is the resource's own answer, not a promise that `load_more` will
    /// advance: the offset also stops once the next window would start at or
    /// past `total`, and `load_more` then returns
    /// `Skipped(SkipReason::PastTotal)` while this stays true. Callers that
    /// loop on `has_more` must stop on any `Skipped` outcome; the scroll
    /// trigger fires once per entry into view, so it never retries on its own.
    pub has_more: bool,
    /// First page, first load
    pub is_loading: bool,
    /// A later page is in flight
    pub is_fetching_more: bool,
    /// Last fetch failure reported by the source
    pub error: Option<Arc<Error>>,
}

impl<T> PaginatedView<T> {
    /// View with no data
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
            is_loading: false,
            is_fetching_more: false,
            error: None,
        }
    }

    /// Whether neither load flag is set
    pub fn is_idle(&self) -> bool {
        !self.is_loading && !self.is_fetching_more
    }
}

impl<T> Default for PaginatedView<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for PaginatedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedView")
            .field("items", &self.items)
            .field("total", &self.total)
            .field("has_more", &self.has_more)
            .field("is_loading", &self.is_loading)
            .field("is_fetching_more", &self.is_fetching_more)
            .field("error", &self.error.as_ref().map(ToString::to_string))
            .finish()
    }
}

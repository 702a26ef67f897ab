//! Query contract types
//!
//! These mirror the `useQuery(args, {skip}) -> {data, isLoading, isFetching}`
//! shape the pagination engine is written against.

use crate::error::Error;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Resource arguments plus the pagination window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageArgs<A> {
    /// Resource-identifying arguments (e.g. the community id)
    pub args: A,
    /// Page size
    pub limit: u32,
    /// Cursor into the result set
    pub offset: u32,
}

impl<A> PageArgs<A> {
    /// Create page arguments
    pub fn new(args: A, limit: u32, offset: u32) -> Self {
        Self {
            args,
            limit,
            offset,
        }
    }

    /// The `(limit, offset)` window these arguments request
    pub fn window(&self) -> (u32, u32) {
        (self.limit, self.offset)
    }
}

/// Per-call query options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Do not fetch; report an empty, idle result
    pub skip: bool,
}

impl QueryOptions {
    /// Options that fetch normally
    pub fn fetch() -> Self {
        Self { skip: false }
    }

    /// Options that suppress fetching
    pub fn skip() -> Self {
        Self { skip: true }
    }
}

/// Snapshot of a query at one point in time
#[derive(Clone)]
pub struct QueryResult<P> {
    /// Latest (possibly merged) response, if any arrived
    pub data: Option<P>,
    /// A fetch is in flight and no data exists yet
    pub is_loading: bool,
    /// A fetch is in flight
    pub is_fetching: bool,
    /// Last fetch failure for this entry
    pub error: Option<Arc<Error>>,
}

impl<P> QueryResult<P> {
    /// Result for a skipped or never-started query
    pub fn idle() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_fetching: false,
            error: None,
        }
    }

    /// Result carrying settled data
    pub fn ready(data: P) -> Self {
        Self {
            data: Some(data),
            is_loading: false,
            is_fetching: false,
            error: None,
        }
    }

    /// Result for a first fetch still in flight
    pub fn loading() -> Self {
        Self {
            data: None,
            is_loading: true,
            is_fetching: true,
            error: None,
        }
    }

    /// Result for a refetch in flight while older data is shown
    pub fn refetching(data: P) -> Self {
        Self {
            data: Some(data),
            is_loading: false,
            is_fetching: true,
            error: None,
        }
    }

    /// Result for a failed fetch
    pub fn failed(error: Arc<Error>) -> Self {
        Self {
            error: Some(error),
            ..Self::idle()
        }
    }

    /// Whether any data has arrived
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

impl<P> Default for QueryResult<P> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<P: fmt::Debug> fmt::Debug for QueryResult<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("data", &self.data)
            .field("is_loading", &self.is_loading)
            .field("is_fetching", &self.is_fetching)
            .field("error", &self.error.as_ref().map(ToString::to_string))
            .finish()
    }
}

/// The cache-aware page fetch primitive the pagination engine wraps
///
/// Calls are synchronous snapshots: asking for a window that is not cached
/// starts a fetch and reports it as in flight; asking again for a cached
/// window returns the stored data without another round-trip.
pub trait PageQuery {
    /// Resource-identifying arguments
    type Args: Clone + Eq + Hash + fmt::Debug;
    /// One page response
    type Page: Clone;

    /// Snapshot the query for the given window
    fn query(&self, args: &PageArgs<Self::Args>, options: QueryOptions) -> QueryResult<Self::Page>;
}

impl<Q: PageQuery + ?Sized> PageQuery for Arc<Q> {
    type Args = Q::Args;
    type Page = Q::Page;

    fn query(&self, args: &PageArgs<Self::Args>, options: QueryOptions) -> QueryResult<Self::Page> {
        (**self).query(args, options)
    }
}

/// How a cache stores responses for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// One entry per `(args, limit, offset)`
    #[default]
    PerPage,
    /// One entry per `args`; each new window is merged into it
    MergeByResource,
}

/// Invalidation tag attached to cache entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Tag kind, e.g. `members`
    pub kind: String,
    /// Optional resource id; `None` matches every id of the kind
    pub id: Option<String>,
}

impl Tag {
    /// Tag for every entry of a kind
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    /// Tag for one resource of a kind
    pub fn id(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
        }
    }

    /// Whether invalidating `self` should drop an entry tagged `other`
    pub fn matches(&self, other: &Tag) -> bool {
        self.kind == other.kind && (self.id.is_none() || self.id == other.id)
    }
}

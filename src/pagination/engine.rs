//! Paginated query engine
//!
//! Turns a single-window [`PageQuery`] into an incrementally loadable list.
//! Each [`PaginatedQuery::poll`] is one render cycle: it queries the source
//! for the current window and derives the read model from whatever (merged)
//! data the source returns. [`PaginatedQuery::load_more`] only moves the
//! offset; the next poll issues the fetch.

use super::types::{
    ExtractItems, ExtractTotal, HasMorePredicate, LoadMoreOutcome, PaginatedView,
    PaginationState, DEFAULT_LIMIT,
};
use crate::error::{Error, Result};
use crate::query::{PageArgs, PageQuery, QueryOptions};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

type SharedState = Arc<Mutex<PaginationState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, PaginationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn advance(state: &SharedState) -> LoadMoreOutcome {
    let outcome = lock(state).try_advance();
    match outcome {
        LoadMoreOutcome::Advanced { offset } => debug!(offset, "load more"),
        LoadMoreOutcome::Skipped(reason) => debug!(%reason, "load more skipped"),
    }
    outcome
}

/// Builder for [`PaginatedQuery`]
pub struct PaginatedQueryBuilder<Q: PageQuery, T> {
    source: Q,
    limit: u32,
    enabled: bool,
    extract_items: Option<ExtractItems<Q::Page, T>>,
    extract_total: Option<ExtractTotal<Q::Page>>,
    has_more: Option<HasMorePredicate<Q::Page>>,
}

impl<Q: PageQuery, T> PaginatedQueryBuilder<Q, T> {
    /// Start building an engine over `source`
    pub fn new(source: Q) -> Self {
        Self {
            source,
            limit: DEFAULT_LIMIT,
            enabled: true,
            extract_items: None,
            extract_total: None,
            has_more: None,
        }
    }

    /// Set the page size
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Enable or disable fetching
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the item extractor
    #[must_use]
    pub fn extract_items<F>(mut self, f: F) -> Self
    where
        F: Fn(&Q::Page) -> Vec<T> + Send + Sync + 'static,
    {
        self.extract_items = Some(Arc::new(f));
        self
    }

    /// Set the total extractor
    #[must_use]
    pub fn extract_total<F>(mut self, f: F) -> Self
    where
        F: Fn(&Q::Page) -> u64 + Send + Sync + 'static,
    {
        self.extract_total = Some(Arc::new(f));
        self
    }

    /// Set the "is there another page" predicate, called as `(page, offset, limit)`
    #[must_use]
    pub fn has_more<F>(mut self, f: F) -> Self
    where
        F: Fn(&Q::Page, u32, u32) -> bool + Send + Sync + 'static,
    {
        self.has_more = Some(Arc::new(f));
        self
    }

    /// Build the engine for a resource
    pub fn build<K: PartialEq + fmt::Debug>(
        self,
        base_args: Q::Args,
        reset_key: K,
    ) -> Result<PaginatedQuery<Q, T, K>> {
        if self.limit == 0 {
            return Err(Error::invalid_value("limit", "page size must be positive"));
        }

        Ok(PaginatedQuery {
            source: self.source,
            base_args,
            reset_key,
            enabled: self.enabled,
            extract_items: self
                .extract_items
                .ok_or_else(|| Error::missing_field("extract_items"))?,
            extract_total: self
                .extract_total
                .ok_or_else(|| Error::missing_field("extract_total"))?,
            has_more: self
                .has_more
                .ok_or_else(|| Error::missing_field("has_more"))?,
            state: Arc::new(Mutex::new(PaginationState::new(self.limit))),
        })
    }
}

/// Incrementally loadable list over a [`PageQuery`]
///
/// `K` is the reset key: whenever [`set_args`](Self::set_args) receives a
/// different key the offset returns to 0 and everything observed so far is
/// dropped.
pub struct PaginatedQuery<Q: PageQuery, T, K> {
    source: Q,
    base_args: Q::Args,
    reset_key: K,
    enabled: bool,
    extract_items: ExtractItems<Q::Page, T>,
    extract_total: ExtractTotal<Q::Page>,
    has_more: HasMorePredicate<Q::Page>,
    state: SharedState,
}

impl<Q: PageQuery, T, K: PartialEq + fmt::Debug> PaginatedQuery<Q, T, K> {
    /// Point the engine at (possibly) another resource
    pub fn set_args(&mut self, base_args: Q::Args, reset_key: K) {
        if reset_key != self.reset_key {
            debug!(from = ?self.reset_key, to = ?reset_key, "reset key changed");
            lock(&self.state).reset();
            self.reset_key = reset_key;
        }
        self.base_args = base_args;
    }

    /// Enable or disable fetching
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Return to the first page of the current resource
    pub fn reset(&self) {
        lock(&self.state).reset();
    }

    /// Run one render cycle against the source
    pub fn poll(&self) -> PaginatedView<T> {
        let (offset, limit) = {
            let state = lock(&self.state);
            (state.offset, state.limit)
        };

        let args = PageArgs::new(self.base_args.clone(), limit, offset);
        let options = QueryOptions {
            skip: !self.enabled,
        };
        let result = self.source.query(&args, options);

        let mut view = match &result.data {
            Some(page) => PaginatedView {
                items: (self.extract_items)(page),
                total: (self.extract_total)(page),
                has_more: (self.has_more)(page, offset, limit),
                ..PaginatedView::empty()
            },
            None => PaginatedView::empty(),
        };
        view.is_loading = offset == 0 && result.is_loading;
        view.is_fetching_more = offset > 0 && result.is_fetching;
        view.error = result.error;

        lock(&self.state).observe(
            offset,
            result.data.is_some(),
            view.total,
            view.has_more,
            result.is_fetching,
        );
        view
    }

    /// Advance to the next page if the guards allow it
    pub fn load_more(&self) -> LoadMoreOutcome {
        advance(&self.state)
    }

    /// Cloneable handle that calls [`load_more`](Self::load_more)
    pub fn load_more_handle(&self) -> LoadMoreHandle {
        LoadMoreHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Current offset
    pub fn offset(&self) -> u32 {
        lock(&self.state).offset
    }

    /// Page size
    pub fn limit(&self) -> u32 {
        lock(&self.state).limit
    }

    /// Snapshot of the offset bookkeeping
    pub fn state(&self) -> PaginationState {
        lock(&self.state).clone()
    }

    /// Current reset key
    pub fn reset_key(&self) -> &K {
        &self.reset_key
    }

    /// Current resource arguments
    pub fn base_args(&self) -> &Q::Args {
        &self.base_args
    }

    /// The wrapped source
    pub fn source(&self) -> &Q {
        &self.source
    }
}

impl<Q: PageQuery, T, K: fmt::Debug> fmt::Debug for PaginatedQuery<Q, T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedQuery")
            .field("base_args", &self.base_args)
            .field("reset_key", &self.reset_key)
            .field("enabled", &self.enabled)
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

/// Detached `load_more` for one [`PaginatedQuery`]
#[derive(Clone)]
pub struct LoadMoreHandle {
    state: SharedState,
}

impl LoadMoreHandle {
    /// Advance to the next page if the guards allow it
    pub fn load_more(&self) -> LoadMoreOutcome {
        advance(&self.state)
    }

    /// Convert into a plain callback, e.g. for an infinite-scroll trigger
    pub fn into_callback(self) -> Arc<dyn Fn() + Send + Sync> {
        Arc::new(move || {
            self.load_more();
        })
    }
}

impl fmt::Debug for LoadMoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadMoreHandle")
            .field("offset", &lock(&self.state).offset)
            .finish()
    }
}

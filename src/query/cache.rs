//! Response cache backing [`PageQuery`]
//!
//! A [`QueryCache`] wraps one [`Endpoint`] and answers synchronous snapshot
//! queries while fetches run on the tokio runtime. Entries are keyed by the
//! full window (`PerPage`) or by the resource arguments alone
//! (`MergeByResource`), in which case the resource's single entry is built
//! window by window from offset 0, merging each later window as it arrives.

use super::types::{CacheMode, PageArgs, PageQuery, QueryOptions, QueryResult, Tag};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

/// A remote resource that can be fetched one window at a time
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// Resource-identifying arguments
    type Args: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// One page response
    type Page: Clone + Send + Sync + 'static;

    /// Endpoint name used in logs and errors
    fn name(&self) -> &str;

    /// Fetch one window
    async fn fetch(&self, args: &PageArgs<Self::Args>) -> Result<Self::Page>;

    /// How responses are keyed
    fn cache_mode(&self) -> CacheMode {
        CacheMode::PerPage
    }

    /// Fold a later window into the cached response for the same resource
    ///
    /// Only called in `MergeByResource` mode for windows with a non-zero offset.
    fn merge(&self, cached: &mut Self::Page, incoming: Self::Page, args: &PageArgs<Self::Args>) {
        let _ = args;
        *cached = incoming;
    }

    /// Tags attached to entries for these arguments
    fn tags(&self, args: &Self::Args) -> Vec<Tag> {
        let _ = args;
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey<A> {
    args: A,
    window: Option<(u32, u32)>,
}

struct Entry<P> {
    data: Option<P>,
    error: Option<Arc<Error>>,
    in_flight: Option<(u32, u32)>,
    /// Windows already requested for this entry, successful or not
    requested: Vec<(u32, u32)>,
    /// Windows waiting for the in-flight fetch to finish, lowest offset first
    pending: VecDeque<(u32, u32)>,
    /// Set while an invalidated merged entry is refetched behind its old data
    stale: bool,
    refresh: Option<P>,
    generation: u64,
    tags: Vec<Tag>,
}

impl<P: Clone> Entry<P> {
    fn new(generation: u64, tags: Vec<Tag>) -> Self {
        Self {
            data: None,
            error: None,
            in_flight: None,
            requested: Vec::new(),
            pending: VecDeque::new(),
            stale: false,
            refresh: None,
            generation,
            tags,
        }
    }

    fn snapshot(&self) -> QueryResult<P> {
        let is_fetching = self.in_flight.is_some();
        QueryResult {
            data: self.data.clone(),
            is_loading: is_fetching && self.data.is_none(),
            is_fetching,
            error: self.error.clone(),
        }
    }

    /// Move the next pending window in flight, unless one already is
    fn start_next(&mut self) -> Option<(u32, u32)> {
        if self.in_flight.is_some() {
            return None;
        }
        let window = self.pending.pop_front()?;
        self.in_flight = Some(window);
        Some(window)
    }

    /// Keep the data visible but refetch every requested window from offset 0
    fn mark_stale(&mut self, generation: u64) {
        let mut windows = self.requested.clone();
        windows.sort_by_key(|&(_, offset)| offset);
        self.pending = windows.into();
        self.in_flight = None;
        self.error = None;
        self.stale = true;
        self.refresh = None;
        self.generation = generation;
    }

    /// Swap the rebuilt data in once the refetch chain has ended
    fn finish_refresh(&mut self) {
        self.stale = false;
        let fresh = self.refresh.take();
        if self.error.is_none() {
            if let Some(fresh) = fresh {
                self.data = Some(fresh);
            }
        }
    }
}

struct Inner<E: Endpoint> {
    endpoint: E,
    entries: Mutex<HashMap<EntryKey<E::Args>, Entry<E::Page>>>,
    next_generation: AtomicU64,
    fetches: AtomicUsize,
    revision: watch::Sender<u64>,
    runtime: Handle,
}

impl<E: Endpoint> Inner<E> {
    fn entries(&self) -> MutexGuard<'_, HashMap<EntryKey<E::Args>, Entry<E::Page>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn merged(&self) -> bool {
        self.endpoint.cache_mode() == CacheMode::MergeByResource
    }

    fn key(&self, args: &PageArgs<E::Args>) -> EntryKey<E::Args> {
        let window = if self.merged() {
            None
        } else {
            Some(args.window())
        };
        EntryKey {
            args: args.args.clone(),
            window,
        }
    }

    fn generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst)
    }

    /// Windows a request for `window` depends on, in fetch order
    ///
    /// A merged entry is only ever built from offset 0 upwards, so asking for
    /// a later window first schedules every earlier one of the same size.
    fn windows_through(&self, window: (u32, u32)) -> Vec<(u32, u32)> {
        let (limit, offset) = window;
        if !self.merged() || limit == 0 || offset % limit != 0 {
            return vec![window];
        }
        (0..=offset / limit).map(|k| (limit, k * limit)).collect()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    fn spawn_fetch(self: &Arc<Self>, key: EntryKey<E::Args>, window: (u32, u32), generation: u64) {
        let (limit, offset) = window;
        let args = PageArgs::new(key.args.clone(), limit, offset);
        self.fetches.fetch_add(1, Ordering::SeqCst);
        debug!(endpoint = self.endpoint.name(), ?args, "fetch start");

        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            let result = inner.endpoint.fetch(&args).await;
            inner.complete(key, &args, generation, result);
        });
    }

    fn complete(
        self: &Arc<Self>,
        key: EntryKey<E::Args>,
        args: &PageArgs<E::Args>,
        generation: u64,
        result: Result<E::Page>,
    ) {
        let next = {
            let mut entries = self.entries();
            let Some(entry) = entries.get_mut(&key).filter(|e| e.generation == generation) else {
                debug!(
                    endpoint = self.endpoint.name(),
                    ?args,
                    "discarding response for invalidated entry"
                );
                return;
            };

            entry.in_flight = None;
            match result {
                Ok(page) => {
                    let merge = self.merged() && args.offset > 0;
                    let target = if entry.stale {
                        &mut entry.refresh
                    } else {
                        &mut entry.data
                    };
                    match target.as_mut() {
                        Some(cached) if merge => self.endpoint.merge(cached, page, args),
                        _ => *target = Some(page),
                    }
                    entry.error = None;
                    debug!(endpoint = self.endpoint.name(), ?args, "fetch complete");
                }
                Err(e) => {
                    warn!(endpoint = self.endpoint.name(), ?args, error = %e, "fetch failed");
                    entry.error = Some(Arc::new(e));
                    entry.pending.clear();
                }
            }

            let next = entry.start_next();
            if next.is_none() && entry.stale {
                entry.finish_refresh();
            }
            next.map(|window| (window, entry.generation))
        };

        if let Some((window, generation)) = next {
            self.spawn_fetch(key, window, generation);
        }
        self.bump();
    }
}

/// Cache of responses for one endpoint
///
/// Cloning is cheap; clones share entries.
pub struct QueryCache<E: Endpoint> {
    inner: Arc<Inner<E>>,
}

impl<E: Endpoint> Clone for QueryCache<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Endpoint> QueryCache<E> {
    /// Create a cache that spawns fetches on the current tokio runtime
    pub fn new(endpoint: E) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::QueryRuntime {
            message: e.to_string(),
        })?;
        Ok(Self::with_runtime(endpoint, runtime))
    }

    /// Create a cache that spawns fetches on the given runtime
    pub fn with_runtime(endpoint: E, runtime: Handle) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                endpoint,
                entries: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                fetches: AtomicUsize::new(0),
                revision,
                runtime,
            }),
        }
    }

    /// The wrapped endpoint
    pub fn endpoint(&self) -> &E {
        &self.inner.endpoint
    }

    /// Number of fetches started so far
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    /// Whether any fetch is in flight
    pub fn is_fetching(&self) -> bool {
        self.inner.entries().values().any(|e| e.in_flight.is_some())
    }

    /// Receiver that observes every cache state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Wait until no fetch is in flight
    pub async fn settled(&self) -> Result<()> {
        let mut rx = self.subscribe();
        while self.is_fetching() {
            rx.changed().await.map_err(|e| Error::QueryRuntime {
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Invalidate every entry matching `tag`
    ///
    /// Per-page entries, and merged entries that never received data, are
    /// dropped. Merged entries with data stay visible and are marked stale:
    /// the next query refetches every window they were built from, starting
    /// at offset 0, and swaps the rebuilt data in once the last one arrives.
    /// Responses still in flight for invalidated entries are discarded on
    /// arrival. Returns the number of entries invalidated.
    pub fn invalidate(&self, tag: &Tag) -> usize {
        let merged = self.inner.merged();
        let mut invalidated = 0;
        self.inner.entries().retain(|_, entry| {
            if !entry.tags.iter().any(|t| tag.matches(t)) {
                return true;
            }
            invalidated += 1;
            if merged && entry.data.is_some() {
                entry.mark_stale(self.inner.generation());
                true
            } else {
                false
            }
        });
        if invalidated > 0 {
            debug!(
                endpoint = self.inner.endpoint.name(),
                ?tag,
                invalidated,
                "invalidated entries"
            );
            self.inner.bump();
        }
        invalidated
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.entries().clear();
        self.inner.bump();
    }
}

impl<E: Endpoint> PageQuery for QueryCache<E> {
    type Args = E::Args;
    type Page = E::Page;

    fn query(&self, args: &PageArgs<Self::Args>, options: QueryOptions) -> QueryResult<Self::Page> {
        if options.skip {
            return QueryResult::idle();
        }

        let key = self.inner.key(args);
        let window = args.window();

        let (snapshot, fetch) = {
            let mut entries = self.inner.entries();
            let entry = entries.entry(key.clone()).or_insert_with(|| {
                Entry::new(
                    self.inner.generation(),
                    self.inner.endpoint.tags(&args.args),
                )
            });

            if !entry.requested.contains(&window) {
                for w in self.inner.windows_through(window) {
                    if !entry.requested.contains(&w) {
                        entry.requested.push(w);
                        entry.pending.push_back(w);
                    }
                }
            }
            let fetch = entry.start_next().map(|w| (w, entry.generation));
            (entry.snapshot(), fetch)
        };

        if let Some((window, generation)) = fetch {
            self.inner.spawn_fetch(key, window, generation);
        }
        snapshot
    }
}

impl<E: Endpoint> fmt::Debug for QueryCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("endpoint", &self.inner.endpoint.name())
            .field("entries", &self.inner.entries().len())
            .field("fetches", &self.fetch_count())
            .finish()
    }
}

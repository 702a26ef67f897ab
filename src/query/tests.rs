//! Tests for the query cache

use super::*;
use crate::error::{Error, Result};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq)]
struct NumbersPage {
    items: Vec<u32>,
    total: u32,
}

/// Serves `0..total` in windows; each fetch waits for a gate permit
struct Numbers {
    total: u32,
    mode: CacheMode,
    gate: Arc<Semaphore>,
    calls: Arc<Mutex<Vec<PageArgs<String>>>>,
    fail_offsets: Vec<u32>,
}

impl Numbers {
    fn new(total: u32, mode: CacheMode) -> Self {
        Self {
            total,
            mode,
            gate: Arc::new(Semaphore::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_offsets: Vec::new(),
        }
    }
}

#[async_trait]
impl Endpoint for Numbers {
    type Args = String;
    type Page = NumbersPage;

    fn name(&self) -> &str {
        "numbers"
    }

    async fn fetch(&self, args: &PageArgs<String>) -> Result<NumbersPage> {
        self.calls.lock().unwrap().push(args.clone());
        self.gate.acquire().await.unwrap().forget();
        if self.fail_offsets.contains(&args.offset) {
            return Err(Error::http_status(500, "boom"));
        }
        let end = (args.offset + args.limit).min(self.total);
        Ok(NumbersPage {
            items: (args.offset..end).collect(),
            total: self.total,
        })
    }

    fn cache_mode(&self) -> CacheMode {
        self.mode
    }

    fn merge(&self, cached: &mut NumbersPage, incoming: NumbersPage, _args: &PageArgs<String>) {
        cached.items.extend(incoming.items);
        cached.total = incoming.total;
    }

    fn tags(&self, args: &String) -> Vec<Tag> {
        vec![Tag::id("numbers", args.clone())]
    }
}

fn window(args: &str, limit: u32, offset: u32) -> PageArgs<String> {
    PageArgs::new(args.to_string(), limit, offset)
}

#[test]
fn test_tag_matching() {
    let all = Tag::kind("members");
    let one = Tag::id("members", "c1");

    assert!(all.matches(&one));
    assert!(one.matches(&one));
    assert!(!one.matches(&Tag::id("members", "c2")));
    assert!(!all.matches(&Tag::id("events", "c1")));
}

#[test]
fn test_new_requires_runtime() {
    let result = QueryCache::new(Numbers::new(5, CacheMode::PerPage));
    assert!(matches!(result, Err(Error::QueryRuntime { .. })));
}

#[tokio::test]
async fn test_skip_never_fetches() {
    let cache = QueryCache::new(Numbers::new(5, CacheMode::PerPage)).unwrap();

    let result = cache.query(&window("a", 2, 0), QueryOptions::skip());

    assert!(!result.has_data());
    assert!(!result.is_loading);
    assert!(!result.is_fetching);
    assert_eq!(cache.fetch_count(), 0);
}

#[tokio::test]
async fn test_first_query_loads_then_settles() {
    let endpoint = Numbers::new(5, CacheMode::PerPage);
    let gate = Arc::clone(&endpoint.gate);
    let cache = QueryCache::new(endpoint).unwrap();

    let first = cache.query(&window("a", 2, 0), QueryOptions::fetch());
    assert!(first.is_loading);
    assert!(first.is_fetching);

    gate.add_permits(1);
    cache.settled().await.unwrap();

    let second = cache.query(&window("a", 2, 0), QueryOptions::fetch());
    assert!(!second.is_loading);
    assert!(!second.is_fetching);
    assert_eq!(second.data.unwrap().items, vec![0, 1]);
    assert_eq!(cache.fetch_count(), 1);
}

#[tokio::test]
async fn test_repeated_query_while_in_flight_does_not_refetch() {
    let endpoint = Numbers::new(5, CacheMode::PerPage);
    let gate = Arc::clone(&endpoint.gate);
    let cache = QueryCache::new(endpoint).unwrap();

    for _ in 0..5 {
        cache.query(&window("a", 2, 0), QueryOptions::fetch());
    }
    assert_eq!(cache.fetch_count(), 1);

    gate.add_permits(1);
    cache.settled().await.unwrap();
    assert_eq!(cache.fetch_count(), 1);
}

#[tokio::test]
async fn test_per_page_entries_are_independent() {
    let endpoint = Numbers::new(5, CacheMode::PerPage);
    endpoint.gate.add_permits(10);
    let cache = QueryCache::new(endpoint).unwrap();

    cache.query(&window("a", 2, 0), QueryOptions::fetch());
    cache.query(&window("a", 2, 2), QueryOptions::fetch());
    cache.settled().await.unwrap();

    let page0 = cache.query(&window("a", 2, 0), QueryOptions::fetch());
    let page1 = cache.query(&window("a", 2, 2), QueryOptions::fetch());
    assert_eq!(page0.data.unwrap().items, vec![0, 1]);
    assert_eq!(page1.data.unwrap().items, vec![2, 3]);
}

#[tokio::test]
async fn test_merge_by_resource_appends_in_order() {
    let endpoint = Numbers::new(5, CacheMode::MergeByResource);
    endpoint.gate.add_permits(10);
    let cache = QueryCache::new(endpoint).unwrap();

    cache.query(&window("a", 2, 0), QueryOptions::fetch());
    cache.settled().await.unwrap();

    let refetch = cache.query(&window("a", 2, 2), QueryOptions::fetch());
    assert!(refetch.is_fetching);
    assert!(!refetch.is_loading);
    assert_eq!(refetch.data.unwrap().items, vec![0, 1]);
    cache.settled().await.unwrap();

    cache.query(&window("a", 2, 4), QueryOptions::fetch());
    cache.settled().await.unwrap();

    let merged = cache.query(&window("a", 2, 4), QueryOptions::fetch());
    assert_eq!(merged.data.unwrap().items, vec![0, 1, 2, 3, 4]);
    assert_eq!(cache.fetch_count(), 3);
}

#[tokio::test]
async fn test_merge_keeps_resources_apart() {
    let endpoint = Numbers::new(5, CacheMode::MergeByResource);
    endpoint.gate.add_permits(10);
    let cache = QueryCache::new(endpoint).unwrap();

    cache.query(&window("a", 2, 0), QueryOptions::fetch());
    cache.query(&window("b", 2, 0), QueryOptions::fetch());
    cache.settled().await.unwrap();
    cache.query(&window("a", 2, 2), QueryOptions::fetch());
    cache.settled().await.unwrap();

    let a = cache.query(&window("a", 2, 2), QueryOptions::fetch());
    let b = cache.query(&window("b", 2, 0), QueryOptions::fetch());
    assert_eq!(a.data.unwrap().items, vec![0, 1, 2, 3]);
    assert_eq!(b.data.unwrap().items, vec![0, 1]);
}

#[tokio::test]
async fn test_failure_is_recorded_without_retry() {
    let mut endpoint = Numbers::new(5, CacheMode::PerPage);
    endpoint.fail_offsets = vec![0];
    endpoint.gate.add_permits(10);
    let cache = QueryCache::new(endpoint).unwrap();

    cache.query(&window("a", 2, 0), QueryOptions::fetch());
    cache.settled().await.unwrap();

    let result = cache.query(&window("a", 2, 0), QueryOptions::fetch());
    assert!(!result.has_data());
    assert!(!result.is_fetching);
    assert!(matches!(
        result.error.as_deref(),
        Some(Error::HttpStatus { status: 500, .. })
    ));
    assert_eq!(cache.fetch_count(), 1);
}

#[tokio::test]
async fn test_invalidate_refetches_and_discards_stale_response() {
    let endpoint = Numbers::new(5, CacheMode::PerPage);
    let gate = Arc::clone(&endpoint.gate);
    let calls = Arc::clone(&endpoint.calls);
    let cache = QueryCache::new(endpoint).unwrap();

    cache.query(&window("a", 2, 0), QueryOptions::fetch());
    assert_eq!(cache.invalidate(&Tag::id("numbers", "a")), 1);
    assert_eq!(cache.invalidate(&Tag::id("numbers", "zzz")), 0);

    let again = cache.query(&window("a", 2, 0), QueryOptions::fetch());
    assert!(again.is_loading);

    gate.add_permits(2);
    cache.settled().await.unwrap();

    let result = cache.query(&window("a", 2, 0), QueryOptions::fetch());
    assert_eq!(result.data.unwrap().items, vec![0, 1]);
    assert_eq!(cache.fetch_count(), 2);
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalidated_merged_entry_refetches_behind_old_data() {
    let endpoint = Numbers::new(5, CacheMode::MergeByResource);
    let gate = Arc::clone(&endpoint.gate);
    let calls = Arc::clone(&endpoint.calls);
    let cache = QueryCache::new(endpoint).unwrap();

    gate.add_permits(2);
    cache.query(&window("a", 2, 0), QueryOptions::fetch());
    cache.settled().await.unwrap();
    cache.query(&window("a", 2, 2), QueryOptions::fetch());
    cache.settled().await.unwrap();

    assert_eq!(cache.invalidate(&Tag::id("numbers", "a")), 1);

    // Still scrolled to the second window
    let stale = cache.query(&window("a", 2, 2), QueryOptions::fetch());
    assert!(stale.is_fetching);
    assert!(!stale.is_loading);
    assert_eq!(stale.data.unwrap().items, vec![0, 1, 2, 3]);

    let mut rx = cache.subscribe();
    gate.add_permits(1);
    rx.changed().await.unwrap();

    let halfway = cache.query(&window("a", 2, 2), QueryOptions::fetch());
    assert!(halfway.is_fetching);
    assert_eq!(halfway.data.unwrap().items, vec![0, 1, 2, 3]);

    gate.add_permits(1);
    cache.settled().await.unwrap();

    let fresh = cache.query(&window("a", 2, 2), QueryOptions::fetch());
    assert!(!fresh.is_fetching);
    assert_eq!(fresh.data.unwrap().items, vec![0, 1, 2, 3]);
    let offsets: Vec<u32> = calls.lock().unwrap().iter().map(|a| a.offset).collect();
    assert_eq!(offsets, vec![0, 2, 0, 2]);
}

#[tokio::test]
async fn test_merged_query_for_later_window_starts_at_zero() {
    let endpoint = Numbers::new(5, CacheMode::MergeByResource);
    endpoint.gate.add_permits(10);
    let calls = Arc::clone(&endpoint.calls);
    let cache = QueryCache::new(endpoint).unwrap();

    let first = cache.query(&window("a", 2, 4), QueryOptions::fetch());
    assert!(first.is_loading);
    cache.settled().await.unwrap();

    let result = cache.query(&window("a", 2, 4), QueryOptions::fetch());
    assert_eq!(result.data.unwrap().items, vec![0, 1, 2, 3, 4]);
    let offsets: Vec<u32> = calls.lock().unwrap().iter().map(|a| a.offset).collect();
    assert_eq!(offsets, vec![0, 2, 4]);
    assert_eq!(cache.fetch_count(), 3);
}

#[tokio::test]
async fn test_subscribe_observes_completion() {
    let endpoint = Numbers::new(5, CacheMode::PerPage);
    let gate = Arc::clone(&endpoint.gate);
    let cache = QueryCache::new(endpoint).unwrap();
    let mut rx = cache.subscribe();

    cache.query(&window("a", 2, 0), QueryOptions::fetch());
    gate.add_permits(1);
    rx.changed().await.unwrap();

    assert!(cache
        .query(&window("a", 2, 0), QueryOptions::fetch())
        .has_data());
}

//! Cache endpoints for the paginated community resources
//!
//! Members and events merge windows per resource so a list view sees every
//! page fetched so far. Merging skips items already present, which covers rows
//! shifting between windows when membership changes mid-scroll. The
//! communities listing is browsed a page at a time and keeps one entry per
//! window.

use super::client::{CommunitiesClient, CommunitiesQuery};
use crate::error::Result;
use crate::query::{CacheMode, Endpoint, PageArgs, Tag};
use crate::types::{CommunitiesPage, CommunityId, EventsPage, MembersPage};
use async_trait::async_trait;
use std::collections::HashSet;
use std::hash::Hash;

/// Tag kind for member listings
pub const MEMBERS_TAG: &str = "members";
/// Tag kind for event listings
pub const EVENTS_TAG: &str = "events";
/// Tag kind for the communities listing
pub const COMMUNITIES_TAG: &str = "communities";

fn append_unique<T, K: Eq + Hash>(cached: &mut Vec<T>, incoming: Vec<T>, key: impl Fn(&T) -> K) {
    let mut seen: HashSet<K> = cached.iter().map(&key).collect();
    cached.extend(incoming.into_iter().filter(|item| seen.insert(key(item))));
}

/// Members of one community
#[derive(Debug, Clone)]
pub struct MembersEndpoint {
    client: CommunitiesClient,
}

impl MembersEndpoint {
    /// Fetch members pages through `client`
    pub fn new(client: CommunitiesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Endpoint for MembersEndpoint {
    type Args = CommunityId;
    type Page = MembersPage;

    fn name(&self) -> &str {
        MEMBERS_TAG
    }

    async fn fetch(&self, args: &PageArgs<CommunityId>) -> Result<MembersPage> {
        self.client
            .members(&args.args, args.limit, args.offset)
            .await
    }

    fn cache_mode(&self) -> CacheMode {
        CacheMode::MergeByResource
    }

    fn merge(&self, cached: &mut MembersPage, incoming: MembersPage, _args: &PageArgs<CommunityId>) {
        append_unique(&mut cached.results, incoming.results, |m| m.member_address.clone());
        cached.total = incoming.total;
        cached.page = incoming.page;
        cached.pages = incoming.pages;
        cached.limit = incoming.limit;
    }

    fn tags(&self, args: &CommunityId) -> Vec<Tag> {
        vec![Tag::id(MEMBERS_TAG, args.clone())]
    }
}

/// Events of one community
#[derive(Debug, Clone)]
pub struct EventsEndpoint {
    client: CommunitiesClient,
}

impl EventsEndpoint {
    /// Fetch events pages through `client`
    pub fn new(client: CommunitiesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Endpoint for EventsEndpoint {
    type Args = CommunityId;
    type Page = EventsPage;

    fn name(&self) -> &str {
        EVENTS_TAG
    }

    async fn fetch(&self, args: &PageArgs<CommunityId>) -> Result<EventsPage> {
        self.client.events(&args.args, args.limit, args.offset).await
    }

    fn cache_mode(&self) -> CacheMode {
        CacheMode::MergeByResource
    }

    fn merge(&self, cached: &mut EventsPage, incoming: EventsPage, _args: &PageArgs<CommunityId>) {
        append_unique(&mut cached.events, incoming.events, |e| e.id.clone());
        cached.total = incoming.total;
    }

    fn tags(&self, args: &CommunityId) -> Vec<Tag> {
        vec![Tag::id(EVENTS_TAG, args.clone())]
    }
}

/// The communities listing
#[derive(Debug, Clone)]
pub struct CommunitiesEndpoint {
    client: CommunitiesClient,
}

impl CommunitiesEndpoint {
    /// Fetch listing pages through `client`
    pub fn new(client: CommunitiesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Endpoint for CommunitiesEndpoint {
    type Args = CommunitiesQuery;
    type Page = CommunitiesPage;

    fn name(&self) -> &str {
        COMMUNITIES_TAG
    }

    async fn fetch(&self, args: &PageArgs<CommunitiesQuery>) -> Result<CommunitiesPage> {
        self.client.list(&args.args, args.limit, args.offset).await
    }

    fn tags(&self, _args: &CommunitiesQuery) -> Vec<Tag> {
        vec![Tag::kind(COMMUNITIES_TAG)]
    }
}

//! Shared caches for the community resources

use super::adapters::{
    communities_list, community_events, community_members, CommunitiesList, CommunityEvents,
    CommunityMembers,
};
use super::client::{CommunitiesClient, CommunitiesQuery};
use super::endpoints::{
    CommunitiesEndpoint, EventsEndpoint, MembersEndpoint, COMMUNITIES_TAG, MEMBERS_TAG,
};
use crate::config::{ClientConfig, PaginationConfig};
use crate::error::Result;
use crate::http::HttpClient;
use crate::query::{QueryCache, Tag};
use crate::types::CommunityId;
use tracing::debug;

/// Members of every community, one merged entry per community
pub type MembersCache = QueryCache<MembersEndpoint>;
/// Events of every community, one merged entry per community
pub type EventsCache = QueryCache<EventsEndpoint>;
/// Listing pages, one entry per search and window
pub type CommunitiesCache = QueryCache<CommunitiesEndpoint>;

/// Owns one cache per resource so every list over the same community shares
/// fetched pages, and keeps them fresh across membership changes
#[derive(Debug, Clone)]
pub struct Communities {
    client: CommunitiesClient,
    members: MembersCache,
    events: EventsCache,
    communities: CommunitiesCache,
    limits: PaginationConfig,
}

impl Communities {
    /// Create the caches on the current tokio runtime
    pub fn new(client: CommunitiesClient, limits: PaginationConfig) -> Result<Self> {
        Ok(Self {
            members: QueryCache::new(MembersEndpoint::new(client.clone()))?,
            events: QueryCache::new(EventsEndpoint::new(client.clone()))?,
            communities: QueryCache::new(CommunitiesEndpoint::new(client.clone()))?,
            client,
            limits,
        })
    }

    /// Build the HTTP client and caches from a validated config
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::with_config(config.http_config())?;
        Self::new(CommunitiesClient::new(http), config.pagination)
    }

    /// The typed API client shared by all three caches
    pub fn client(&self) -> &CommunitiesClient {
        &self.client
    }

    /// Cache behind every members list
    pub fn members_cache(&self) -> &MembersCache {
        &self.members
    }

    /// Cache behind every events list
    pub fn events_cache(&self) -> &EventsCache {
        &self.events
    }

    /// Cache behind the communities listing
    pub fn communities_cache(&self) -> &CommunitiesCache {
        &self.communities
    }

    /// Page sizes used when building lists
    pub fn limits(&self) -> PaginationConfig {
        self.limits
    }

    /// Paginated members of a community
    pub fn members(
        &self,
        community_id: impl Into<CommunityId>,
    ) -> Result<CommunityMembers<MembersCache>> {
        community_members(
            self.members.clone(),
            community_id,
            self.limits.members_limit,
        )
    }

    /// Paginated events of a community
    pub fn events(
        &self,
        community_id: impl Into<CommunityId>,
    ) -> Result<CommunityEvents<EventsCache>> {
        community_events(self.events.clone(), community_id, self.limits.events_limit)
    }

    /// Paginated communities listing
    pub fn communities(
        &self,
        filter: CommunitiesQuery,
    ) -> Result<CommunitiesList<CommunitiesCache>> {
        communities_list(
            self.communities.clone(),
            filter,
            self.limits.communities_limit,
        )
    }

    /// Join a community, then invalidate its cached members and the listing
    pub async fn join(&self, community_id: &CommunityId) -> Result<()> {
        self.client.join(community_id).await?;
        self.membership_changed(community_id);
        Ok(())
    }

    /// Leave a community, then invalidate its cached members and the listing
    pub async fn leave(&self, community_id: &CommunityId) -> Result<()> {
        self.client.leave(community_id).await?;
        self.membership_changed(community_id);
        Ok(())
    }

    fn membership_changed(&self, community_id: &CommunityId) {
        let members = self
            .members
            .invalidate(&Tag::id(MEMBERS_TAG, community_id.clone()));
        // Member counts are part of every listing page
        let listings = self.communities.invalidate(&Tag::kind(COMMUNITIES_TAG));
        debug!(community = %community_id, members, listings, "membership changed");
    }
}

//! Paginated list adapters for community resources
//!
//! Each adapter wires the generic engine to one resource shape: which field
//! holds the items, where the total lives and how "more" is decided. The
//! community id is both the query argument and the reset key, and an empty id
//! keeps the query skipped.

use super::client::CommunitiesQuery;
use crate::error::Result;
use crate::pagination::{PaginatedQuery, PaginatedQueryBuilder};
use crate::query::PageQuery;
use crate::types::{
    CommunitiesPage, Community, CommunityEvent, CommunityId, EventsPage, Member, MembersPage,
};

/// Page size for member listings
pub const MEMBERS_LIMIT: u32 = 10;
/// Page size for event listings
pub const EVENTS_LIMIT: u32 = 12;
/// Page size for the communities listing
pub const COMMUNITIES_LIMIT: u32 = 20;

/// Members of one community, reset when the community changes
pub type CommunityMembers<Q> = PaginatedQuery<Q, Member, CommunityId>;

/// Events of one community, reset when the community changes
pub type CommunityEvents<Q> = PaginatedQuery<Q, CommunityEvent, CommunityId>;

/// The communities listing, reset when the filter changes
pub type CommunitiesList<Q> = PaginatedQuery<Q, Community, CommunitiesQuery>;

/// Paginated members of `community_id`; more pages remain while `page < pages`
pub fn community_members<Q>(
    source: Q,
    community_id: impl Into<CommunityId>,
    limit: u32,
) -> Result<CommunityMembers<Q>>
where
    Q: PageQuery<Args = CommunityId, Page = MembersPage>,
{
    let id = community_id.into();
    PaginatedQueryBuilder::new(source)
        .limit(limit)
        .enabled(!id.is_empty())
        .extract_items(|page: &MembersPage| page.results.clone())
        .extract_total(|page: &MembersPage| page.total)
        .has_more(|page: &MembersPage, _, _| page.page < page.pages)
        .build(id.clone(), id)
}

/// Paginated events of `community_id`; more remain while fewer than `total`
/// events have been received
pub fn community_events<Q>(
    source: Q,
    community_id: impl Into<CommunityId>,
    limit: u32,
) -> Result<CommunityEvents<Q>>
where
    Q: PageQuery<Args = CommunityId, Page = EventsPage>,
{
    let id = community_id.into();
    PaginatedQueryBuilder::new(source)
        .limit(limit)
        .enabled(!id.is_empty())
        .extract_items(|page: &EventsPage| page.events.clone())
        .extract_total(|page: &EventsPage| page.total)
        .has_more(|page: &EventsPage, _, _| (page.events.len() as u64) < page.total)
        .build(id.clone(), id)
}

/// Paginated communities listing for `filter`
pub fn communities_list<Q>(
    source: Q,
    filter: CommunitiesQuery,
    limit: u32,
) -> Result<CommunitiesList<Q>>
where
    Q: PageQuery<Args = CommunitiesQuery, Page = CommunitiesPage>,
{
    PaginatedQueryBuilder::new(source)
        .limit(limit)
        .extract_items(|page: &CommunitiesPage| page.results.clone())
        .extract_total(|page: &CommunitiesPage| page.total)
        .has_more(|page: &CommunitiesPage, _, _| page.page < page.pages)
        .build(filter.clone(), filter)
}

/// Point a per-community list at another community
///
/// A different id starts over at offset 0; an empty id disables fetching.
pub fn select_community<Q, T>(
    query: &mut PaginatedQuery<Q, T, CommunityId>,
    community_id: impl Into<CommunityId>,
) where
    Q: PageQuery<Args = CommunityId>,
{
    let id = community_id.into();
    query.set_enabled(!id.is_empty());
    query.set_args(id.clone(), id);
}

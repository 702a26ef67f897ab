//! Communities module
//!
//! The paginated resources of the communities API wired onto the generic
//! pagination engine.
//!
//! # Overview
//!
//! - `CommunitiesClient` - typed REST calls (listing, members, events, join, leave)
//! - `MembersEndpoint`, `EventsEndpoint`, `CommunitiesEndpoint` - cache endpoints
//! - `community_members`, `community_events`, `communities_list` - list adapters
//! - `Communities` - shared caches plus membership mutations that invalidate them
//!
//! # Example
//!
//! ```ignore
//! let communities = Communities::from_config(&ClientConfig::from_env()?)?;
//! let members = communities.members("c1")?;
//!
//! let view = members.poll();
//! communities.members_cache().settled().await?;
//! let view = members.poll();
//! if view.has_more {
//!     members.load_more();
//! }
//! ```

mod adapters;
mod client;
mod endpoints;
mod service;

pub use adapters::{
    communities_list, community_events, community_members, select_community, CommunitiesList,
    CommunityEvents, CommunityMembers, COMMUNITIES_LIMIT, EVENTS_LIMIT, MEMBERS_LIMIT,
};
pub use client::{CommunitiesClient, CommunitiesQuery};
pub use endpoints::{
    CommunitiesEndpoint, EventsEndpoint, MembersEndpoint, COMMUNITIES_TAG, EVENTS_TAG,
    MEMBERS_TAG,
};
pub use service::{Communities, CommunitiesCache, EventsCache, MembersCache};

//! Common types used throughout community-pager
//!
//! Domain models returned by the communities API, the page envelopes the
//! paginated endpoints respond with, and a few shared enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Identifier of a community as used in API paths
pub type CommunityId = String;

// ============================================================================
// Backoff Type
// ============================================================================

/// Backoff strategy for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Communities
// ============================================================================

/// Visibility of a community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    /// Anyone can join
    #[default]
    Public,
    /// Joining requires approval
    Private,
}

/// A community (social group)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Wallet address of the owner
    #[serde(rename = "ownerAddress", default)]
    pub owner_address: String,
    #[serde(default)]
    pub privacy: Privacy,
    #[serde(rename = "membersCount", default)]
    pub members_count: u64,
    #[serde(default)]
    pub active: bool,
}

/// Role of a member inside a community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Moderator,
    #[default]
    Member,
}

/// A member of a community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "memberAddress")]
    pub member_address: String,
    #[serde(rename = "communityId")]
    pub community_id: CommunityId,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "joinedAt", default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
}

/// An event hosted by a community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "startAt", default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishAt", default)]
    pub finish_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub live: bool,
}

// ============================================================================
// Page Envelopes
// ============================================================================

/// One response of the paginated members endpoint
///
/// `page` is 1-based and `pages` is the page count for the requested limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembersPage {
    #[serde(default)]
    pub results: Vec<Member>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub limit: u64,
}

/// One response of the paginated events endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub events: Vec<CommunityEvent>,
    #[serde(default)]
    pub total: u64,
}

/// One response of the communities listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunitiesPage {
    #[serde(default)]
    pub results: Vec<Community>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub pages: u64,
}

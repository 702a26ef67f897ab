//! REST client for the communities API

use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::{CommunitiesPage, CommunityId, EventsPage, MembersPage};
use serde_json::json;
use tracing::info;

/// Filter for the communities listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CommunitiesQuery {
    /// Free-text search on name and description
    pub search: Option<String>,
}

impl CommunitiesQuery {
    /// Listing filtered by a search term
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
        }
    }
}

fn community_path(id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(Error::invalid_value("community_id", "must not be empty"));
    }
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    Ok(format!("/v1/communities/{encoded}"))
}

fn window(limit: u32, offset: u32) -> RequestConfig {
    RequestConfig::new()
        .query("limit", limit)
        .query("offset", offset)
}

/// Typed access to the communities endpoints
#[derive(Debug, Clone)]
pub struct CommunitiesClient {
    http: HttpClient,
}

impl CommunitiesClient {
    /// Wrap an HTTP client whose base URL points at the API
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// One window of the communities listing
    pub async fn list(
        &self,
        query: &CommunitiesQuery,
        limit: u32,
        offset: u32,
    ) -> Result<CommunitiesPage> {
        let mut config = window(limit, offset);
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            config = config.query("search", search);
        }
        self.http.get_json_with_config("/v1/communities", config).await
    }

    /// One window of a community's members
    pub async fn members(&self, id: &str, limit: u32, offset: u32) -> Result<MembersPage> {
        let path = format!("{}/members", community_path(id)?);
        self.http
            .get_json_with_config(&path, window(limit, offset))
            .await
    }

    /// One window of a community's events
    pub async fn events(&self, id: &str, limit: u32, offset: u32) -> Result<EventsPage> {
        let path = format!("{}/events", community_path(id)?);
        self.http
            .get_json_with_config(&path, window(limit, offset))
            .await
    }

    /// Join a community as the authenticated user
    pub async fn join(&self, id: &CommunityId) -> Result<()> {
        let path = format!("{}/members", community_path(id)?);
        self.http.post(&path, json!({})).await?;
        info!(community = %id, "joined community");
        Ok(())
    }

    /// Leave a community as the authenticated user
    pub async fn leave(&self, id: &CommunityId) -> Result<()> {
        let path = format!("{}/members", community_path(id)?);
        self.http.delete(&path).await?;
        info!(community = %id, "left community");
        Ok(())
    }
}

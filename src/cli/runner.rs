//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, PagingArgs};
use crate::communities::{Communities, CommunitiesQuery};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::pagination::{LoadMoreOutcome, PaginatedQuery};
use crate::query::{CacheMode, Endpoint, QueryCache};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info};

/// Totals of one paging run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingSummary {
    /// Items written
    pub count: usize,
    /// Total reported by the API
    pub total: u64,
    /// Windows fetched
    pub pages: usize,
    /// Whether the API reports more items than were written
    pub has_more: bool,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::List { search, paging } => {
                let config = self.load_config(paging)?;
                let communities = Communities::from_config(&config)?;
                let filter = CommunitiesQuery {
                    search: search.clone(),
                };
                let query = communities.communities(filter)?;
                let summary = self.page_through("COMMUNITY", &query, paging.all).await?;
                self.output_summary("communities", &summary);
                Ok(())
            }
            Commands::Members {
                community_id,
                paging,
            } => {
                let config = self.load_config(paging)?;
                let communities = Communities::from_config(&config)?;
                let query = communities.members(community_id.as_str())?;
                let summary = self.page_through("MEMBER", &query, paging.all).await?;
                self.output_summary("members", &summary);
                Ok(())
            }
            Commands::Events {
                community_id,
                paging,
            } => {
                let config = self.load_config(paging)?;
                let communities = Communities::from_config(&config)?;
                let query = communities.events(community_id.as_str())?;
                let summary = self.page_through("EVENT", &query, paging.all).await?;
                self.output_summary("events", &summary);
                Ok(())
            }
            Commands::Join { community_id } => {
                let config = self.load_config(&PagingArgs::default())?;
                let communities = Communities::from_config(&config)?;
                communities.join(community_id).await?;
                self.output_message(&json!({
                    "type": "MEMBERSHIP",
                    "community": community_id,
                    "status": "joined"
                }));
                Ok(())
            }
            Commands::Leave { community_id } => {
                let config = self.load_config(&PagingArgs::default())?;
                let communities = Communities::from_config(&config)?;
                communities.leave(community_id).await?;
                self.output_message(&json!({
                    "type": "MEMBERSHIP",
                    "community": community_id,
                    "status": "left"
                }));
                Ok(())
            }
            Commands::Config => self.show_config(),
        }
    }

    /// Load the config file (or defaults) and apply a page size override
    fn load_config(&self, paging: &PagingArgs) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::from_env()?,
        };

        if let Some(limit) = paging.limit {
            if limit == 0 {
                return Err(Error::invalid_value("--limit", "page size must be positive"));
            }
            let pagination = &mut config.pagination;
            pagination.members_limit = limit;
            pagination.events_limit = limit;
            pagination.communities_limit = limit;
        }
        Ok(config)
    }

    fn show_config(&self) -> Result<()> {
        let mut config = self.load_config(&PagingArgs::default())?;
        if config.api.token.is_some() {
            config.api.token = Some("********".to_string());
        }
        self.output_message(&json!({
            "type": "CONFIG",
            "config": serde_json::to_value(&config)?
        }));
        Ok(())
    }

    /// Drive a paginated list, writing each item once as it arrives
    ///
    /// Every iteration is one render cycle: poll, wait for the cache when a
    /// fetch is in flight, write the new items, then ask for the next window.
    /// Without `all` only the first window is written.
    pub async fn page_through<E, T, K>(
        &self,
        kind: &str,
        query: &PaginatedQuery<QueryCache<E>, T, K>,
        all: bool,
    ) -> Result<PagingSummary>
    where
        E: Endpoint,
        T: Serialize,
        K: PartialEq + fmt::Debug,
    {
        let cache = query.source();
        let merged = cache.endpoint().cache_mode() == CacheMode::MergeByResource;
        let mut summary = PagingSummary {
            count: 0,
            total: 0,
            pages: 0,
            has_more: false,
        };
        let mut written = 0;

        loop {
            let view = query.poll();
            if cache.is_fetching() {
                cache.settled().await?;
                continue;
            }
            if let Some(error) = &view.error {
                return Err(Error::query(cache.endpoint().name(), error.to_string()));
            }
            // Merged views repeat earlier windows; per-page views hold only the current one
            let fresh = if merged {
                &view.items[written.min(view.items.len())..]
            } else {
                &view.items[..]
            };
            for item in fresh {
                self.output_message(&json!({ "type": kind, "record": item }));
            }
            summary.count += fresh.len();
            summary.pages += 1;
            summary.total = view.total;
            summary.has_more = view.has_more;
            written = view.items.len();
            info!(
                resource = cache.endpoint().name(),
                offset = query.offset(),
                items = fresh.len(),
                total = view.total,
                "page received"
            );

            if !all {
                break;
            }
            match query.load_more() {
                LoadMoreOutcome::Advanced { offset } => debug!(offset, "next window"),
                LoadMoreOutcome::Skipped(reason) => {
                    debug!(%reason, "paging finished");
                    break;
                }
            }
        }

        Ok(summary)
    }

    fn output_summary(&self, resource: &str, summary: &PagingSummary) {
        self.output_message(&json!({
            "type": "SUMMARY",
            "resource": resource,
            "count": summary.count,
            "total": summary.total,
            "pages": summary.pages,
            "has_more": summary.has_more
        }));
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # community-pager
//!
//! Incremental ("load more" / infinite scroll) pagination for list views over
//! offset-paginated REST resources.
//!
//! ## Features
//!
//! - **Pagination Engine**: offset/limit bookkeeping with reset keys, a
//!   one-request-in-flight guard and pluggable has-more predicates
//! - **Query Cache**: synchronous cache-aware queries backed by tokio fetches,
//!   per-page or merged-per-resource entries, tag invalidation
//! - **Infinite Scroll Trigger**: intersection-driven `load_more` with a
//!   headless viewport for terminals and tests
//! - **Communities API**: members, events and listing adapters plus join/leave
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use community_pager::{ClientConfig, Communities, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let communities = Communities::from_config(&ClientConfig::from_env()?)?;
//!     let members = communities.members("c1")?;
//!
//!     loop {
//!         members.poll();
//!         communities.members_cache().settled().await?;
//!         let view = members.poll();
//!         println!("{} of {}", view.items.len(), view.total);
//!         if !members.load_more().is_advanced() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            List view (CLI, TUI, InfiniteScrollTrigger)       │
//! │          poll() → PaginatedView        load_more()           │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┴────────────────────────────────┐
//! │          PaginatedQuery (offset, reset key, guards)          │
//! └─────────────────────────────┬────────────────────────────────┘
//!                               │ PageQuery::query(args, skip)
//! ┌─────────────────────────────┴────────────────────────────────┐
//! │       QueryCache<Endpoint> (dedup, merge, invalidation)      │
//! └─────────────────────────────┬────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┴────────────────────────────────┐
//! │           HttpClient (retry, backoff, bearer token)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Domain models and shared types
pub mod types;

/// Client configuration
pub mod config;

/// HTTP client with retry and backoff
pub mod http;

/// Cache-aware query collaborator
pub mod query;

/// Incremental pagination engine
pub mod pagination;

/// Infinite-scroll trigger and headless viewport
pub mod scroll;

/// Communities API resources
pub mod communities;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use communities::{Communities, CommunitiesClient};
pub use config::ClientConfig;
pub use pagination::{LoadMoreOutcome, PaginatedQuery, PaginatedQueryBuilder, PaginatedView};
pub use query::{PageQuery, QueryCache};
pub use scroll::{InfiniteScrollTrigger, TriggerProps, VirtualViewport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

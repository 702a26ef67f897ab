//! Query module
//!
//! The data-fetching collaborator the pagination engine wraps.
//!
//! # Overview
//!
//! - `PageQuery` - the synchronous, cache-aware `query(args, options)` contract
//! - `QueryCache` - tokio-backed implementation over an async `Endpoint`
//! - `Tag` - invalidation labels attached to cache entries

mod cache;
mod types;

pub use cache::{Endpoint, QueryCache};
pub use types::{CacheMode, PageArgs, PageQuery, QueryOptions, QueryResult, Tag};

#[cfg(test)]
mod tests;

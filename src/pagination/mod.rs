//! Pagination module
//!
//! Incremental offset pagination over a cache-aware query source.
//!
//! # Overview
//!
//! A [`PaginatedQuery`] owns the offset for one resource and is configured with
//! plain closures (item extractor, total extractor, has-more predicate), so the
//! same engine serves offset/total resources and page/pages resources alike.
//! Offsets only grow while the reset key stays the same; a new key starts over
//! at offset 0.

mod engine;
mod types;

pub use engine::{LoadMoreHandle, PaginatedQuery, PaginatedQueryBuilder};
pub use types::{
    ExtractItems, ExtractTotal, HasMorePredicate, LoadMoreOutcome, PaginatedView,
    PaginationState, SkipReason, DEFAULT_LIMIT,
};

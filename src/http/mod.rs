//! HTTP client module
//!
//! Provides the reqwest-backed client the communities endpoints fetch through.
//!
//! # Features
//!
//! - **Automatic Retries**: 429 and 5xx responses, timeouts and connection errors
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Bearer Auth**: Optional token sent as a default header

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};

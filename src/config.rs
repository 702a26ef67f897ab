//! Client configuration
//!
//! Loaded from a YAML file, with every field optional, then overridden from
//! the environment:
//!
//! ```yaml
//! api:
//!   base_url: https://api.example.org
//!   timeout_secs: 30
//!   max_retries: 3
//!   backoff: exponential
//!   token: secret
//! pagination:
//!   members_limit: 10
//!   events_limit: 12
//!   communities_limit: 20
//! ```

use crate::communities::{COMMUNITIES_LIMIT, EVENTS_LIMIT, MEMBERS_LIMIT};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding `api.base_url`
pub const ENV_API_URL: &str = "COMMUNITIES_API_URL";

/// Environment variable overriding `api.token`
pub const ENV_API_TOKEN: &str = "COMMUNITIES_API_TOKEN";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Page sizes per resource
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl ClientConfig {
    /// Load from a YAML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => {
                return Err::<Self, _>(e).with_context(|| {
                    format!("Failed to read config file '{}'", path.display())
                });
            }
        };

        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        config.apply_env();
        config.validate()?;
        debug!(path = %path.display(), base_url = %config.api.base_url, "loaded config");
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document (no environment overrides)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply `COMMUNITIES_API_URL` and `COMMUNITIES_API_TOKEN`
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_API_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, base_url: Option<String>, token: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.api.token = Some(token);
        }
    }

    /// Check values that would make the client unusable
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::invalid_value("api.base_url", "must not be empty"));
        }
        url::Url::parse(&self.api.base_url)?;

        for (field, limit) in [
            ("pagination.members_limit", self.pagination.members_limit),
            ("pagination.events_limit", self.pagination.events_limit),
            ("pagination.communities_limit", self.pagination.communities_limit),
        ] {
            if limit == 0 {
                return Err(Error::invalid_value(field, "page size must be positive"));
            }
        }
        Ok(())
    }

    /// HTTP client settings for the API
    pub fn http_config(&self) -> HttpClientConfig {
        let api = &self.api;
        let mut builder = HttpClientConfig::builder()
            .base_url(api.base_url.clone())
            .timeout(Duration::from_secs(api.timeout_secs))
            .max_retries(api.max_retries)
            .backoff(
                api.backoff,
                Duration::from_millis(api.initial_backoff_ms),
                Duration::from_millis(api.max_backoff_ms),
            )
            .header("Accept", "application/json");

        if let Some(token) = &api.token {
            builder = builder.bearer_token(token);
        }
        builder.build()
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Connection settings for the communities API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without the `/v1` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff strategy between retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Bearer token for authenticated calls (join/leave)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.example.org".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    100
}

fn default_max_backoff() -> u64 {
    60_000
}

// ============================================================================
// Pagination Config
// ============================================================================

/// Page sizes per resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_members_limit")]
    pub members_limit: u32,

    #[serde(default = "default_events_limit")]
    pub events_limit: u32,

    #[serde(default = "default_communities_limit")]
    pub communities_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            members_limit: default_members_limit(),
            events_limit: default_events_limit(),
            communities_limit: default_communities_limit(),
        }
    }
}

fn default_members_limit() -> u32 {
    MEMBERS_LIMIT
}

fn default_events_limit() -> u32 {
    EVENTS_LIMIT
}

fn default_communities_limit() -> u32 {
    COMMUNITIES_LIMIT
}

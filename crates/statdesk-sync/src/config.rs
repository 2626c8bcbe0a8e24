//! # Remote Configuration
//!
//! Connection settings for the external statistics collection service.
//!
//! ## Configuration Sources (Priority Order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Loading                                │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STAT_COLLECTOR_URL, STAT_COLLECTOR_TIMEOUT_SECS,                   │
//! │     STAT_COLLECTOR_MAX_ATTEMPTS       → apply_env_overrides()          │
//! │                                                                         │
//! │  2. TOML section (`[remote]` in statdesk.toml, read by the app)        │
//! │                                                                         │
//! │  3. Defaults (lowest priority)                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The configuration is handed to [`HttpRemoteClient`](crate::HttpRemoteClient)
//! at construction. Nothing in this crate reads files or global settings
//! beyond the environment overrides above.
//!
//! ## Example TOML
//! ```toml
//! [remote]
//! base_url = "https://stats.example.com/"
//! timeout_secs = 20
//! max_attempts = 3
//!
//! [remote.headers]
//! Authorization = "Token abc"
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Path segment of the collector resource on the remote service.
pub const COLLECTOR_RESOURCE: &str = "statistics_collector";

// =============================================================================
// Remote Configuration
// =============================================================================

/// Settings for talking to the statistics service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Service root, e.g. `https://stats.example.com/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Extra headers sent with every request (auth tokens and the like).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Total attempts per request when the transport fails.
    /// HTTP status responses are never retried.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound for a single retry delay (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    200
}

fn default_max_backoff() -> u64 {
    5
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            headers: BTreeMap::new(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl RemoteConfig {
    /// Creates a configuration pointing at `base_url` with default tuning.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Applies `STAT_COLLECTOR_*` environment variables on top of `self`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("STAT_COLLECTOR_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.base_url = url;
        }

        if let Ok(timeout) = std::env::var("STAT_COLLECTOR_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.timeout_secs = secs;
            }
        }

        if let Ok(attempts) = std::env::var("STAT_COLLECTOR_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse::<u32>() {
                debug!(max_attempts = n, "Overriding remote attempts from environment");
                self.max_attempts = n;
            }
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let url = Url::parse(&self.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidUrl(format!(
                "Remote URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.max_attempts == 0 {
            return Err(SyncError::InvalidConfig(
                "max_attempts must be greater than 0".into(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// URL of the collector collection, `{base}/statistics_collector`.
    pub fn collectors_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), COLLECTOR_RESOURCE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry schedule for transport failures.
    ///
    /// The attempt budget is enforced by the caller; the schedule itself
    /// never gives up on elapsed time.
    pub fn backoff_policy(&self) -> ExponentialBackoff {
        let mut policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(self.initial_backoff_ms),
            max_interval: Duration::from_secs(self.max_backoff_secs),
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        };
        // Start from `initial_interval` rather than the library default.
        policy.reset();
        policy
    }
}

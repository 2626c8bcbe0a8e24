//! Service configuration.
//!
//! Defaults, then the TOML file, then environment variables. The `[remote]`
//! table is a [`RemoteConfig`] and honours the `STAT_COLLECTOR_*` overrides.
//!
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:8080"
//!
//! [database]
//! path = "/var/lib/statdesk/statdesk.db"
//! max_connections = 5
//! acquire_timeout_secs = 30
//!
//! [remote]
//! base_url = "https://stats.example.com/"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use statdesk_db::DbConfig;
use statdesk_sync::{RemoteConfig, SyncError};
use tracing::{debug, info};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address, `host:port`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; created on first start.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds a request waits for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("statdesk.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `config_path` (or the platform config dir),
    /// applies environment overrides and validates.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Load(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("STATDESK_BIND_ADDR") {
            debug!(addr = %addr, "Overriding bind address from environment");
            self.server.bind_addr = addr;
        }

        if let Ok(path) = std::env::var("STATDESK_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        self.remote.apply_env_overrides();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "database.acquire_timeout_secs must be greater than 0".into(),
            ));
        }

        self.remote.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind_addr.parse().map_err(|_| {
            ConfigError::InvalidValue(format!("server.bind_addr '{}'", self.server.bind_addr))
        })
    }

    /// Pool settings for the `[database]` section.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .acquire_timeout(Duration::from_secs(self.database.acquire_timeout_secs))
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "statdesk", "statdesk")
            .map(|dirs| dirs.config_dir().join("statdesk.toml"))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Failed to load config: {0}")]
    Load(String),

    #[error(transparent)]
    Remote(#[from] SyncError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_toml_sections() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            bind_addr = "0.0.0.0:9000"

            [database]
            path = "/tmp/stats.db"

            [remote]
            base_url = "https://stats.example.com/"
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr().unwrap().port(), 9000);
        assert_eq!(config.database.path, PathBuf::from("/tmp/stats.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.remote.max_attempts, 5);
    }

    #[test]
    fn test_database_section_drives_pool() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            path = "/tmp/stats.db"
            max_connections = 8
            acquire_timeout_secs = 4
            "#,
        )
        .unwrap();

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/tmp/stats.db"));
        assert_eq!(db.max_connections, 8);
        assert_eq!(db.acquire_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_bad_bind_addr_rejected() {
        let mut config = AppConfig::default();
        config.server.bind_addr = "localhost".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_bad_remote_rejected() {
        let mut config = AppConfig::default();
        config.remote.base_url = "ftp://nowhere".into();
        assert!(matches!(config.validate(), Err(ConfigError::Remote(_))));
    }
}

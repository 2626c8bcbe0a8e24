//! # Statdesk API
//!
//! JSON service for managing statistics collectors and their remote
//! mirrors.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Statdesk API                                     │
//! │                                                                         │
//! │  HTTP ──► routes::* ──► AppState                                       │
//! │                            │                                            │
//! │              reads ────────┼──► Database (statdesk-db)                  │
//! │                            │                                            │
//! │              writes ───────┴──► SyncOrchestrator (statdesk-sync)        │
//! │                                    ├──► Database                        │
//! │                                    └──► statistics service              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use statdesk_db::{Database, DbError};
use statdesk_sync::{HttpRemoteClient, RemoteStatistics, SyncError, SyncOrchestrator};
use tracing::info;

pub use config::AppConfig;
pub use error::{ApiError, ErrorCode};
pub use routes::create_router;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: SyncOrchestrator,
}

impl AppState {
    pub fn new(db: Database, remote: Arc<dyn RemoteStatistics>) -> Self {
        Self {
            orchestrator: SyncOrchestrator::new(db, remote),
        }
    }

    /// Opens the database and builds the HTTP remote client from `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database.path.display(), "Database ready");

        let remote = HttpRemoteClient::new(config.remote.clone())?;
        info!(base_url = %config.remote.base_url, "Statistics service client ready");

        Ok(Self::new(db, Arc::new(remote)))
    }

    pub fn db(&self) -> &Database {
        self.orchestrator.db()
    }
}

/// Errors that stop the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Remote(#[from] SyncError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

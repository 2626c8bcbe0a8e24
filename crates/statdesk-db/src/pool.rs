//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  statdesk-api startup                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.collectors() / db.placements() / db.dictionary(kind) / ...         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled so that readers don't
//! block writers and writers don't block readers.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    CollectorRepository, DictionaryRepository, PeriodRepository, PlacementRepository,
    SnapshotRepository, SupplierRepository,
};
use statdesk_core::DictionaryKind;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/statdesk/statdesk.db")
///     .max_connections(5)
///     .acquire_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// SQLite file, created on first connect. `:memory:` for tests.
    pub database_path: PathBuf,

    /// Pool size. Default: 5
    pub max_connections: u32,

    /// How long a request waits for a free connection. Default: 30 seconds
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the pool size.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets how long to wait for a pooled connection.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Isolated in-memory database.
    ///
    /// Pinned to one connection: every `:memory:` connection is a separate
    /// database, so repositories never touch the pool while holding a
    /// transaction.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// What `/healthz` reports about storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseHealth {
    /// A trivial query succeeded.
    pub reachable: bool,

    /// Embedded migrations not yet recorded in `_sqlx_migrations`.
    pub pending_migrations: usize,
}

impl DatabaseHealth {
    /// Reachable with the full schema in place.
    pub fn is_ready(&self) -> bool {
        self.reachable && self.pending_migrations == 0
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone: every repository holds its own handle to the shared pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./statdesk.db")).await?;
/// let collector = db.collectors().require(id).await?;
/// let clients = db.dictionary(DictionaryKind::Client).list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database and applies pending
    /// migrations.
    ///
    /// Every connection runs in WAL mode with `NORMAL` synchronous and
    /// foreign keys on; the schema relies on `ON DELETE RESTRICT/CASCADE`.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            acquire_timeout_secs = config.acquire_timeout.as_secs(),
            "Database pool created"
        );

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// Raw pool, for assertions on tables no repository exposes.
    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the repository for one dictionary kind.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let clients = db.dictionary(DictionaryKind::Client).list().await?;
    /// ```
    pub fn dictionary(&self, kind: DictionaryKind) -> DictionaryRepository {
        DictionaryRepository::new(self.pool.clone(), kind)
    }

    /// Returns the supplier repository.
    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    /// Returns the collector repository.
    pub fn collectors(&self) -> CollectorRepository {
        CollectorRepository::new(self.pool.clone())
    }

    /// Returns the placement repository.
    pub fn placements(&self) -> PlacementRepository {
        PlacementRepository::new(self.pool.clone())
    }

    /// Returns the period repository.
    pub fn periods(&self) -> PeriodRepository {
        PeriodRepository::new(self.pool.clone())
    }

    /// Returns the snapshot repository.
    pub fn snapshots(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Probes the connection and the schema version.
    pub async fn health_check(&self) -> DatabaseHealth {
        if let Err(e) = sqlx::query("SELECT 1").execute(&self.pool).await {
            warn!(error = %e, "Database health check failed");
            return DatabaseHealth {
                reachable: false,
                pending_migrations: 0,
            };
        }

        let pending_migrations = match migrations::migration_status(&self.pool).await {
            Ok((total, applied)) => total.saturating_sub(applied),
            Err(_) => 0,
        };

        DatabaseHealth {
            reachable: true,
            pending_migrations,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # statdesk-db: Database Layer for Statdesk
//!
//! This crate is the Collector Store: SQLite persistence for dictionaries,
//! collectors, placements, copies and periods, with the referential rules
//! enforced both in code and in the schema.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Statdesk Data Flow                               │
//! │                                                                         │
//! │  Sync orchestrator / HTTP handler                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   statdesk-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Dictionary    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Supplier      │    │ 001_initial_ │  │   │
//! │  │   │ Connection    │    │ Collector     │    │   schema.sql │  │   │
//! │  │   │ Management    │    │ Placement     │    │              │  │   │
//! │  │   │               │    │ Period        │    │              │  │   │
//! │  │   │               │    │ Snapshot      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use statdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("statdesk.db")).await?;
//!
//! let collector = db.collectors().persist_with_periods(&draft).await?;
//! let periods = db.periods().list_for_collector(collector.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DatabaseHealth, DbConfig};

pub use repository::{
    CollectorRepository, DictionaryRepository, PeriodRepository, PlacementRepository,
    SnapshotRepository, SupplierRepository,
};

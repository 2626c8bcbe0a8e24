//! # statdesk-sync: Remote Mirror Sync for Statdesk
//!
//! This crate mirrors collectors into the external statistics collection
//! service and reads collected statistics back for export.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Architecture                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   SyncOrchestrator (orchestrator.rs)             │  │
//! │  │                                                                  │  │
//! │  │  save/delete collector or placement                             │  │
//! │  │    → local transaction (statdesk-db)                            │  │
//! │  │    → delete stale mirror → create mirror → store external id    │  │
//! │  └───────────────┬──────────────────────────────┬───────────────────┘  │
//! │                  │                              │                       │
//! │                  ▼                              ▼                       │
//! │  ┌────────────────────────────┐  ┌──────────────────────────────────┐  │
//! │  │  Database (statdesk-db)    │  │  dyn RemoteStatistics            │  │
//! │  │                            │  │                                  │  │
//! │  │  persist / set_external_id │  │  HttpRemoteClient (client.rs)    │  │
//! │  │  collector_snapshot        │  │  reqwest + backoff retries       │  │
//! │  └────────────────────────────┘  │  RemoteConfig (config.rs)        │  │
//! │                                  └──────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`client`] - `RemoteStatistics` trait and its HTTP implementation
//! - [`config`] - Remote service configuration
//! - [`error`] - Sync error types
//! - [`orchestrator`] - Save/delete flows and the resync protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use statdesk_sync::{HttpRemoteClient, RemoteConfig, SyncOrchestrator};
//!
//! let mut config = RemoteConfig::new("https://stats.example.com/");
//! config.apply_env_overrides();
//! let remote = HttpRemoteClient::new(config)?;
//! let orchestrator = SyncOrchestrator::new(db, Arc::new(remote));
//!
//! let saved = orchestrator.save_collector(&draft).await?;
//! println!("{:?}", saved.sync);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{CreateOutcome, HttpRemoteClient, RemoteStatistics};
pub use config::RemoteConfig;
pub use error::{SyncError, SyncResult};
pub use orchestrator::{SyncOrchestrator, SyncOutcome, Synced};

//! # Sync Orchestrator
//!
//! Keeps each collector's periods and its remote mirror consistent with the
//! local store.
//!
//! ## Full Resync Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    sync_collector(id)                                   │
//! │                                                                         │
//! │  1. external_id set?  ──yes──► DELETE mirror ──► persist external_id=∅ │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  2. snapshot ──► POST create                                           │
//! │          │                                                              │
//! │          ├── 409 naming id X ──► DELETE X ──► POST create (once)       │
//! │          ▼                                                              │
//! │  3. created?  ──yes──► persist external_id = new id      (Linked)      │
//! │          │                                                              │
//! │          └── no ──► external_id stays ∅                  (Unlinked)    │
//! │                                                                         │
//! │  Transport failure at any step ──► logged                (Failed)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every local write happens through the store's storage-only methods
//! (`persist*`, `set_external_id`), so a resync never triggers another one.
//! Remote calls run after the local transaction has committed; a crash in
//! between leaves the mirror stale until the next resync, which always
//! deletes and recreates.

use std::sync::Arc;

use serde::Serialize;
use statdesk_core::{
    Collector, CollectorDraft, CollectorSnapshot, Placement, PlacementDraft, StatsTable,
};
use statdesk_db::Database;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::{CreateOutcome, RemoteStatistics};
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of reconciling one collector with the statistics service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SyncOutcome {
    /// A fresh mirror exists and its id is stored locally.
    #[serde(rename_all = "camelCase")]
    Linked { external_id: Uuid },

    /// The service refused the snapshot; the collector has no mirror.
    Unlinked { reason: String },

    /// The service could not be reached; the local change is kept.
    Failed { error: String },
}

impl SyncOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, SyncOutcome::Linked { .. })
    }
}

/// A stored entity together with what happened to its mirror.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Synced<T> {
    #[serde(flatten)]
    pub entity: T,
    pub sync: SyncOutcome,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives store mutations followed by remote reconciliation.
#[derive(Clone)]
pub struct SyncOrchestrator {
    db: Database,
    remote: Arc<dyn RemoteStatistics>,
}

impl SyncOrchestrator {
    pub fn new(db: Database, remote: Arc<dyn RemoteStatistics>) -> Self {
        Self { db, remote }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Collectors
    // =========================================================================

    /// Saves a collector, regenerates its periods and resyncs it.
    ///
    /// Validation and store errors abort before anything is sent remotely.
    pub async fn save_collector(&self, draft: &CollectorDraft) -> SyncResult<Synced<Collector>> {
        let collector = self.db.collectors().persist_with_periods(draft).await?;
        info!(collector_id = %collector.id, name = %collector.name, "Saved collector");

        let sync = self.sync_collector(collector.id).await?;
        let entity = self.db.collectors().require(collector.id).await?;

        Ok(Synced { entity, sync })
    }

    /// Deletes the remote mirror, then the local collector.
    ///
    /// A transport failure on the remote delete aborts and the local
    /// collector is kept.
    pub async fn delete_collector(&self, id: Uuid) -> SyncResult<()> {
        let collector = self.db.collectors().require(id).await?;

        if let Some(external_id) = collector.external_id {
            info!(collector_id = %id, %external_id, "Deleting remote mirror before local delete");
            self.remote.delete(external_id).await?;
        }

        self.db.collectors().delete(id).await?;
        info!(collector_id = %id, "Deleted collector");
        Ok(())
    }

    /// Runs the full delete-then-recreate protocol for one collector.
    ///
    /// Remote failures are reported in the outcome. Only store errors
    /// (including an unknown collector) are returned as `Err`.
    pub async fn sync_collector(&self, id: Uuid) -> SyncResult<SyncOutcome> {
        let collector = self.db.collectors().require(id).await?;

        match self.reconcile(&collector).await {
            Err(err @ SyncError::Store(_)) => Err(err),
            Err(err) => {
                warn!(collector_id = %id, error = %err, "Remote sync failed");
                Ok(SyncOutcome::Failed {
                    error: err.to_string(),
                })
            }
            ok => ok,
        }
    }

    async fn reconcile(&self, collector: &Collector) -> SyncResult<SyncOutcome> {
        let collectors = self.db.collectors();

        if let Some(external_id) = collector.external_id {
            info!(collector_id = %collector.id, %external_id, "Deleting stale remote mirror");
            self.remote.delete(external_id).await?;
            collectors.set_external_id(collector.id, None).await?;
        }

        let snapshot = self.db.snapshots().collector_snapshot(collector.id).await?;

        let mut outcome = self.remote.create(&snapshot).await?;
        if let CreateOutcome::Conflict {
            existing_id: Some(existing),
            ..
        } = outcome
        {
            info!(
                collector_id = %collector.id,
                conflicting_id = %existing,
                "Remote name conflict, replacing existing mirror"
            );
            self.remote.delete(existing).await?;
            outcome = self.remote.create(&snapshot).await?;
        }

        Ok(match outcome {
            CreateOutcome::Created(external_id) => {
                collectors
                    .set_external_id(collector.id, Some(external_id))
                    .await?;
                info!(collector_id = %collector.id, %external_id, "Collector linked");
                SyncOutcome::Linked { external_id }
            }
            CreateOutcome::Conflict { message, .. } => {
                warn!(collector_id = %collector.id, %message, "Remote conflict unresolved");
                SyncOutcome::Unlinked {
                    reason: format!("conflict: {message}"),
                }
            }
            CreateOutcome::Rejected { status, body } => {
                warn!(collector_id = %collector.id, status, %body, "Remote create rejected");
                SyncOutcome::Unlinked {
                    reason: format!("status {status}: {body}"),
                }
            }
        })
    }

    // =========================================================================
    // Placements
    // =========================================================================

    /// Saves a placement with its links and copies, then resyncs the owner.
    pub async fn save_placement(&self, draft: &PlacementDraft) -> SyncResult<Synced<Placement>> {
        let placement = self.db.placements().persist(draft).await?;
        info!(
            placement_id = %placement.id,
            collector_id = %placement.collector_id,
            "Saved placement"
        );

        let sync = self.sync_collector(placement.collector_id).await?;
        Ok(Synced {
            entity: placement,
            sync,
        })
    }

    /// Deletes a placement, then resyncs the collector it belonged to.
    pub async fn delete_placement(&self, id: Uuid) -> SyncResult<SyncOutcome> {
        let collector_id = self.db.placements().delete(id).await?;
        info!(placement_id = %id, %collector_id, "Deleted placement");

        self.sync_collector(collector_id).await
    }

    // =========================================================================
    // Remote Reads
    // =========================================================================

    /// Reads the collected statistics and flattens them for download.
    ///
    /// ## Errors
    /// - `Store(NotFound)` for an unknown collector
    /// - `NotLinked` when the collector has no mirror
    /// - `Upstream` with the service's status when the read fails
    pub async fn export_statistics(&self, id: Uuid) -> SyncResult<StatsTable> {
        let external_id = self.linked_id(id).await?;
        let payload = self.remote.read_config(external_id).await?;
        Ok(StatsTable::from_payload(&payload)?)
    }

    /// Triggers reminder e-mails for a collector's suppliers.
    pub async fn send_reminder(&self, id: Uuid, reminder_type: &str) -> SyncResult<u16> {
        let external_id = self.linked_id(id).await?;
        let status = self.remote.send_reminder(external_id, reminder_type).await?;
        info!(collector_id = %id, reminder_type, status, "Reminder requested");
        Ok(status)
    }

    /// The payload that would be sent on the next resync.
    pub async fn collector_snapshot(&self, id: Uuid) -> SyncResult<CollectorSnapshot> {
        Ok(self.db.snapshots().collector_snapshot(id).await?)
    }

    async fn linked_id(&self, id: Uuid) -> SyncResult<Uuid> {
        self.db
            .collectors()
            .require(id)
            .await?
            .external_id
            .ok_or(SyncError::NotLinked { collector_id: id })
    }
}

//! # Repository Module
//!
//! Database repository implementations for Statdesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Orchestrator / HTTP handler                                           │
//! │       │                                                                 │
//! │       │  db.collectors().persist_with_periods(&draft)                  │
//! │       ▼                                                                 │
//! │  ┌───────────────────┐ ┌───────────────────┐ ┌───────────────────┐     │
//! │  │ DictionaryRepo    │ │ CollectorRepo     │ │ PlacementRepo     │     │
//! │  │ SupplierRepo      │ │ PeriodRepo        │ │ SnapshotRepo      │     │
//! │  └─────────┬─────────┘ └─────────┬─────────┘ └─────────┬─────────┘     │
//! │            └─────────────────────┼─────────────────────┘               │
//! │                                  ▼                                      │
//! │                          SQLite Database                               │
//! │                                                                         │
//! │  Every write is storage-only: no repository triggers a remote sync.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DictionaryRepository`] - Clients, statistics, placement types
//! - [`SupplierRepository`] - Suppliers (dictionary plus email)
//! - [`CollectorRepository`] - Collectors and their external link
//! - [`PlacementRepository`] - Placements with links and copies
//! - [`PeriodRepository`] - Generated reporting periods
//! - [`SnapshotRepository`] - Remote payload assembly

pub mod collector;
pub mod dictionary;
pub mod period;
pub mod placement;
pub mod snapshot;
pub mod supplier;

pub use collector::CollectorRepository;
pub use dictionary::DictionaryRepository;
pub use period::PeriodRepository;
pub use placement::PlacementRepository;
pub use snapshot::SnapshotRepository;
pub use supplier::SupplierRepository;

use sqlx::{Sqlite, SqliteExecutor};
use statdesk_core::ValidationError;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// Shared helpers
// =============================================================================

/// Parses a stored UUID column.
pub(crate) fn parse_id(table: &str, raw: &str) -> DbResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| DbError::corrupt(table, format!("id '{raw}': {e}")))
}

/// Fails with `Duplicate` when another row of `table` already uses `name_key`.
///
/// `table` always comes from a closed set of static names.
pub(crate) async fn ensure_name_free<'e, E>(
    executor: E,
    table: &'static str,
    name: &str,
    name_key: &str,
    exclude_id: Option<Uuid>,
) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE name_key = ?1 AND id != ?2");
    let taken: i64 = sqlx::query_scalar::<Sqlite, i64>(&sql)
        .bind(name_key)
        .bind(exclude_id.map(|id| id.to_string()).unwrap_or_default())
        .fetch_one(executor)
        .await?;

    if taken > 0 {
        return Err(ValidationError::Duplicate {
            field: "name".to_string(),
            value: name.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Counts rows of `sql` (a `SELECT COUNT(*) ... WHERE x = ?1` query) for `id`.
pub(crate) async fn count_references<'e, E>(executor: E, sql: &str, id: Uuid) -> DbResult<i64>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar::<Sqlite, i64>(sql)
        .bind(id.to_string())
        .fetch_one(executor)
        .await?;
    Ok(count)
}

// =============================================================================
// Test support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use statdesk_core::{
        Collector, CollectorDraft, DictionaryDraft, DictionaryEntry, DictionaryKind, Periodicity,
        Placement, PlacementDraft, Supplier, SupplierDraft, Weekday,
    };
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub async fn dictionary(db: &Database, kind: DictionaryKind, name: &str) -> DictionaryEntry {
        db.dictionary(kind)
            .insert(&DictionaryDraft {
                name: name.to_string(),
                is_active: true,
            })
            .await
            .unwrap()
    }

    pub async fn supplier(db: &Database, name: &str) -> Supplier {
        db.suppliers()
            .insert(&SupplierDraft {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                is_active: true,
            })
            .await
            .unwrap()
    }

    pub fn weekly_draft(name: &str, client_id: Uuid) -> CollectorDraft {
        CollectorDraft {
            id: None,
            name: name.to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 20),
            periodicity: Periodicity::Weekly,
            weekday: Some(Weekday::Wednesday),
            client_id,
        }
    }

    pub async fn collector(db: &Database, name: &str) -> Collector {
        let client = dictionary(db, DictionaryKind::Client, &format!("{name} client")).await;
        db.collectors()
            .persist_with_periods(&weekly_draft(name, client.id))
            .await
            .unwrap()
    }

    pub async fn placement(db: &Database, collector_id: Uuid, label: &str) -> Placement {
        let kind = dictionary(db, DictionaryKind::PlacementType, &format!("{label} type")).await;
        let media = supplier(db, &format!("{label} media")).await;
        let clicks = dictionary(db, DictionaryKind::Statistic, &format!("{label} clicks")).await;

        db.placements()
            .persist(&PlacementDraft {
                id: None,
                collector_id,
                type_id: kind.id,
                supplier_ids: vec![media.id],
                statistic_ids: vec![clicks.id],
                copies: vec!["B copy".to_string(), "A copy".to_string()],
            })
            .await
            .unwrap()
    }
}

//! # Collector Repository
//!
//! Storage for collectors. Every method here is storage-only: nothing in
//! this file talks to the remote service. The orchestrator in
//! `statdesk-sync` wraps these writes with reconciliation.
//!
//! ## Save Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  persist_with_periods(draft)                                           │
//! │  ───────────────────────────                                           │
//! │  BEGIN                                                                 │
//! │   ├── validate + upsert row (external_id untouched)                    │
//! │   ├── generate_periods(...)                                            │
//! │   ├── DELETE periods                                                   │
//! │   └── INSERT periods                                                   │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  set_external_id(id, ..) writes the remote link and nothing else.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use statdesk_core::periods::generate_periods;
use statdesk_core::validation::{name_key, validate_collector_draft};
use statdesk_core::{Collector, CollectorDraft, Periodicity, ValidationError, Weekday};
use tracing::debug;
use uuid::Uuid;

use super::{ensure_name_free, parse_id, period};
use crate::error::{DbError, DbResult};

const TABLE: &str = "collectors";

#[derive(Debug, sqlx::FromRow)]
struct CollectorRow {
    id: String,
    external_id: Option<String>,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    periodicity: Periodicity,
    weekday: Option<Weekday>,
    client_id: String,
}

impl TryFrom<CollectorRow> for Collector {
    type Error = DbError;

    fn try_from(row: CollectorRow) -> DbResult<Self> {
        Ok(Collector {
            id: parse_id(TABLE, &row.id)?,
            external_id: row
                .external_id
                .as_deref()
                .map(|raw| parse_id(TABLE, raw))
                .transpose()?,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            periodicity: row.periodicity,
            weekday: row.weekday,
            client_id: parse_id(TABLE, &row.client_id)?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, external_id, name, start_date, end_date, periodicity, weekday, client_id
    FROM collectors
"#;

/// Repository for collector database operations.
#[derive(Debug, Clone)]
pub struct CollectorRepository {
    pool: SqlitePool,
}

impl CollectorRepository {
    /// Creates a new CollectorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CollectorRepository { pool }
    }

    /// Lists collectors by case-insensitive name.
    pub async fn list(&self) -> DbResult<Vec<Collector>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY name_key ASC");
        sqlx::query_as::<_, CollectorRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Collector::try_from)
            .collect()
    }

    /// Gets a collector by ID.
    pub async fn get(&self, id: Uuid) -> DbResult<Option<Collector>> {
        let mut conn = self.pool.acquire().await?;
        get_in(&mut *conn, id).await
    }

    /// Gets a collector by ID or fails with `NotFound`.
    pub async fn require(&self, id: Uuid) -> DbResult<Collector> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Collector", id))
    }

    /// Inserts or updates a collector and regenerates all of its periods in
    /// the same transaction.
    pub async fn persist_with_periods(&self, draft: &CollectorDraft) -> DbResult<Collector> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let collector = upsert(&mut *tx, draft).await?;
        let specs = generate_periods(
            collector.start_date,
            collector.end_date,
            collector.periodicity,
            collector.weekday,
        )?;
        period::replace_in(&mut *tx, collector.id, &specs).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(collector)
    }

    /// Writes the remote link of a collector. Storage only.
    pub async fn set_external_id(&self, id: Uuid, external_id: Option<Uuid>) -> DbResult<()> {
        debug!(
            collector_id = %id,
            external_id = ?external_id,
            "Setting collector external id"
        );

        let updated = sqlx::query("UPDATE collectors SET external_id = ?2 WHERE id = ?1")
            .bind(id.to_string())
            .bind(external_id.map(|ext| ext.to_string()))
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(DbError::not_found("Collector", id));
        }

        Ok(())
    }

    /// Deletes a collector with its placements, copies, links and periods.
    pub async fn delete(&self, id: Uuid) -> DbResult<()> {
        debug!(collector_id = %id, "Deleting collector");

        let deleted = sqlx::query("DELETE FROM collectors WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(DbError::not_found("Collector", id));
        }

        Ok(())
    }
}

pub(crate) async fn get_in(conn: &mut SqliteConnection, id: Uuid) -> DbResult<Option<Collector>> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
    sqlx::query_as::<_, CollectorRow>(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .map(Collector::try_from)
        .transpose()
}

/// Validates and writes the collector row. The external id of an existing
/// collector is preserved.
async fn upsert(conn: &mut SqliteConnection, draft: &CollectorDraft) -> DbResult<Collector> {
    let draft = validate_collector_draft(draft)?;
    let key = name_key(&draft.name);

    let existing = match draft.id {
        Some(id) => Some(
            get_in(&mut *conn, id)
                .await?
                .ok_or_else(|| DbError::not_found("Collector", id))?,
        ),
        None => None,
    };

    ensure_name_free(&mut *conn, TABLE, &draft.name, &key, draft.id).await?;

    // Inactive clients stay valid for collectors that already use them.
    let client_changed = existing
        .as_ref()
        .map_or(true, |current| current.client_id != draft.client_id);
    ensure_client_selectable(&mut *conn, draft.client_id, client_changed).await?;

    let collector = Collector {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        external_id: existing.and_then(|current| current.external_id),
        name: draft.name,
        start_date: draft.start_date,
        end_date: draft.end_date,
        periodicity: draft.periodicity,
        weekday: draft.weekday,
        client_id: draft.client_id,
    };

    debug!(
        collector_id = %collector.id,
        name = %collector.name,
        periodicity = %collector.periodicity,
        "Persisting collector"
    );

    sqlx::query(
        r#"
        INSERT INTO collectors
            (id, external_id, name, name_key, start_date, end_date, periodicity, weekday, client_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            name_key = excluded.name_key,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            periodicity = excluded.periodicity,
            weekday = excluded.weekday,
            client_id = excluded.client_id
        "#,
    )
    .bind(collector.id.to_string())
    .bind(collector.external_id.map(|ext| ext.to_string()))
    .bind(&collector.name)
    .bind(&key)
    .bind(collector.start_date)
    .bind(collector.end_date)
    .bind(collector.periodicity)
    .bind(collector.weekday)
    .bind(collector.client_id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(collector)
}

async fn ensure_client_selectable(
    conn: &mut SqliteConnection,
    client_id: Uuid,
    must_be_active: bool,
) -> DbResult<()> {
    let client: Option<(String, bool)> =
        sqlx::query_as("SELECT name, is_active FROM clients WHERE id = ?1")
            .bind(client_id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    match client {
        None => Err(DbError::not_found("Client", client_id)),
        Some((name, false)) if must_be_active => Err(ValidationError::Inactive {
            entity: "Client".to_string(),
            name,
        }
        .into()),
        Some(_) => Ok(()),
    }
}

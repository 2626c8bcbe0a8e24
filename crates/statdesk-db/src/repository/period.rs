//! # Period Repository
//!
//! Stored reporting periods. Periods are never edited one by one: every
//! collector save deletes all of them and inserts the freshly generated set,
//! so period ids churn across edits.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use statdesk_core::{Period, PeriodSpec};
use tracing::debug;
use uuid::Uuid;

use super::parse_id;
use crate::error::{DbError, DbResult};

const TABLE: &str = "periods";

#[derive(Debug, sqlx::FromRow)]
struct PeriodRow {
    id: String,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    collector_id: String,
}

impl TryFrom<PeriodRow> for Period {
    type Error = DbError;

    fn try_from(row: PeriodRow) -> DbResult<Self> {
        Ok(Period {
            id: parse_id(TABLE, &row.id)?,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            collector_id: parse_id(TABLE, &row.collector_id)?,
        })
    }
}

/// Repository for period database operations.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    pool: SqlitePool,
}

impl PeriodRepository {
    /// Creates a new PeriodRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PeriodRepository { pool }
    }

    /// Lists a collector's periods ordered by start date.
    pub async fn list_for_collector(&self, collector_id: Uuid) -> DbResult<Vec<Period>> {
        let mut conn = self.pool.acquire().await?;
        list_in(&mut *conn, collector_id).await
    }

    /// Replaces all periods of a collector in one transaction.
    pub async fn replace_for_collector(
        &self,
        collector_id: Uuid,
        specs: &[PeriodSpec],
    ) -> DbResult<Vec<Period>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let periods = replace_in(&mut *tx, collector_id, specs).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(periods)
    }
}

pub(crate) async fn list_in(conn: &mut SqliteConnection, collector_id: Uuid) -> DbResult<Vec<Period>> {
    sqlx::query_as::<_, PeriodRow>(
        r#"
        SELECT id, name, start_date, end_date, collector_id
        FROM periods
        WHERE collector_id = ?1
        ORDER BY start_date ASC
        "#,
    )
    .bind(collector_id.to_string())
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(Period::try_from)
    .collect()
}

/// Deletes every period of `collector_id` and inserts `specs`.
pub(crate) async fn replace_in(
    conn: &mut SqliteConnection,
    collector_id: Uuid,
    specs: &[PeriodSpec],
) -> DbResult<Vec<Period>> {
    let removed = sqlx::query("DELETE FROM periods WHERE collector_id = ?1")
        .bind(collector_id.to_string())
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let mut periods = Vec::with_capacity(specs.len());
    for spec in specs {
        let period = Period {
            id: Uuid::new_v4(),
            name: spec.name.clone(),
            start_date: spec.start_date,
            end_date: spec.end_date,
            collector_id,
        };

        sqlx::query(
            r#"
            INSERT INTO periods (id, name, start_date, end_date, collector_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(period.id.to_string())
        .bind(&period.name)
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(collector_id.to_string())
        .execute(&mut *conn)
        .await?;

        periods.push(period);
    }

    debug!(
        collector_id = %collector_id,
        removed,
        created = periods.len(),
        "Replaced collector periods"
    );

    Ok(periods)
}

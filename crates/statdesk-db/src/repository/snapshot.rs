//! # Snapshot Repository
//!
//! Assembles the full remote payload of a collector from the store.
//!
//! ```text
//! collectors ──► client name, periodicity, weekday
//!     ├── placements (creation order)
//!     │     ├── placement_types.name
//!     │     ├── suppliers (name, email → mail), by name
//!     │     ├── statistics names, by name
//!     │     └── copies texts, by text
//!     └── periods, by start date
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use statdesk_core::snapshot::{PeriodSnapshot, PlacementSnapshot, SupplierSnapshot};
use statdesk_core::{CollectorSnapshot, Placement};
use uuid::Uuid;

use super::{collector, period, placement};
use crate::error::{DbError, DbResult};

/// Read-only repository building [`CollectorSnapshot`]s.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    /// Creates a new SnapshotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    /// Builds the snapshot of a collector.
    ///
    /// ## Errors
    /// `NotFound` for an unknown collector.
    pub async fn collector_snapshot(&self, id: Uuid) -> DbResult<CollectorSnapshot> {
        let mut conn = self.pool.acquire().await?;
        let conn = &mut *conn;

        let collector = collector::get_in(&mut *conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Collector", id))?;

        let client: String = sqlx::query_scalar("SELECT name FROM clients WHERE id = ?1")
            .bind(collector.client_id.to_string())
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Client", collector.client_id))?;

        let mut placement_types = Vec::new();
        for placement in placement::list_in(&mut *conn, collector.id).await? {
            placement_types.push(placement_snapshot(&mut *conn, &placement).await?);
        }

        let periods = period::list_in(&mut *conn, collector.id)
            .await?
            .iter()
            .map(PeriodSnapshot::from)
            .collect();

        Ok(CollectorSnapshot {
            name: collector.name,
            client,
            periodicity: collector.periodicity,
            weekday: collector.weekday,
            placement_types,
            periods,
        })
    }
}

async fn placement_snapshot(
    conn: &mut SqliteConnection,
    placement: &Placement,
) -> DbResult<PlacementSnapshot> {
    let placement_id = placement.id.to_string();

    let name: String = sqlx::query_scalar("SELECT name FROM placement_types WHERE id = ?1")
        .bind(placement.type_id.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("PlacementType", placement.type_id))?;

    let suppliers: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT s.name, s.email FROM placement_suppliers ps
        JOIN suppliers s ON s.id = ps.supplier_id
        WHERE ps.placement_id = ?1
        ORDER BY s.name_key
        "#,
    )
    .bind(&placement_id)
    .fetch_all(&mut *conn)
    .await?;

    let statistics: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT s.name FROM placement_statistics ps
        JOIN statistics s ON s.id = ps.statistic_id
        WHERE ps.placement_id = ?1
        ORDER BY s.name_key
        "#,
    )
    .bind(&placement_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(PlacementSnapshot {
        name,
        suppliers: suppliers
            .into_iter()
            .map(|(name, mail)| SupplierSnapshot { name, mail })
            .collect(),
        statistics,
        copies: placement.copies.iter().map(|c| c.text.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use statdesk_core::{Periodicity, Weekday};

    #[tokio::test]
    async fn test_snapshot_contents() {
        let db = test_db().await;
        let collector = collector(&db, "Spring").await;
        placement(&db, collector.id, "web").await;

        let snapshot = db
            .snapshots()
            .collector_snapshot(collector.id)
            .await
            .unwrap();

        assert_eq!(snapshot.name, "Spring");
        assert_eq!(snapshot.client, "Spring client");
        assert_eq!(snapshot.periodicity, Periodicity::Weekly);
        assert_eq!(snapshot.weekday, Some(Weekday::Wednesday));
        assert_eq!(snapshot.periods.len(), 4);
        assert_eq!(snapshot.periods[0].name, "2023.12.27 - 01.02");

        let web = &snapshot.placement_types[0];
        assert_eq!(web.name, "web type");
        assert_eq!(web.suppliers[0].name, "web media");
        assert_eq!(web.suppliers[0].mail, "web.media@example.com");
        assert_eq!(web.statistics, ["web clicks"]);
        assert_eq!(web.copies, ["A copy", "B copy"]);
    }

    #[tokio::test]
    async fn test_snapshot_unknown_collector() {
        let db = test_db().await;
        let err = db
            .snapshots()
            .collector_snapshot(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}

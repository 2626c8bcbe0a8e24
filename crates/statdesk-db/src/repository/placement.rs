//! # Placement Repository
//!
//! A placement is one row plus its supplier links, statistic links and
//! copies. `persist` writes all four in one transaction, so a half-saved
//! placement is never visible.
//!
//! ## Persist Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── collector exists?                          NotFound              │
//! │   ├── type / suppliers / statistics exist?       NotFound              │
//! │   ├── newly chosen ones active?                  Inactive              │
//! │   ├── UPSERT placements                                                 │
//! │   ├── DELETE + INSERT placement_suppliers                              │
//! │   ├── DELETE + INSERT placement_statistics                             │
//! │   └── DELETE + INSERT copies                                           │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use statdesk_core::validation::validate_placement_draft;
use statdesk_core::{AdCopy, Placement, PlacementDraft, ValidationError};
use tracing::debug;
use uuid::Uuid;

use super::{collector, parse_id};
use crate::error::{DbError, DbResult};

const TABLE: &str = "placements";

#[derive(Debug, sqlx::FromRow)]
struct PlacementRow {
    id: String,
    collector_id: String,
    type_id: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CopyRow {
    id: String,
    text: String,
    placement_id: String,
}

impl TryFrom<CopyRow> for AdCopy {
    type Error = DbError;

    fn try_from(row: CopyRow) -> DbResult<Self> {
        Ok(AdCopy {
            id: parse_id("copies", &row.id)?,
            text: row.text,
            placement_id: parse_id("copies", &row.placement_id)?,
        })
    }
}

/// Repository for placement database operations.
#[derive(Debug, Clone)]
pub struct PlacementRepository {
    pool: SqlitePool,
}

impl PlacementRepository {
    /// Creates a new PlacementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PlacementRepository { pool }
    }

    /// Lists a collector's placements in creation order.
    pub async fn list_for_collector(&self, collector_id: Uuid) -> DbResult<Vec<Placement>> {
        let mut conn = self.pool.acquire().await?;
        list_in(&mut *conn, collector_id).await
    }

    /// Gets a placement with its links and copies.
    pub async fn get(&self, id: Uuid) -> DbResult<Option<Placement>> {
        let mut conn = self.pool.acquire().await?;
        get_in(&mut *conn, id).await
    }

    /// Gets a placement or fails with `NotFound`.
    pub async fn require(&self, id: Uuid) -> DbResult<Placement> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Placement", id))
    }

    /// Inserts or updates a placement, replacing its links and copies.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown collector, type, supplier or statistic,
    ///   or an unknown placement id on update
    /// - `Validation(Inactive)` when a newly chosen dictionary entry is
    ///   inactive
    /// - `Validation(..)` when the placement would move to another collector
    pub async fn persist(&self, draft: &PlacementDraft) -> DbResult<Placement> {
        let draft = validate_placement_draft(draft)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if collector::get_in(&mut *tx, draft.collector_id).await?.is_none() {
            return Err(DbError::not_found("Collector", draft.collector_id));
        }

        let existing = match draft.id {
            Some(id) => Some(
                get_in(&mut *tx, id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Placement", id))?,
            ),
            None => None,
        };

        if let Some(current) = &existing {
            if current.collector_id != draft.collector_id {
                return Err(ValidationError::InvalidFormat {
                    field: "collectorId".to_string(),
                    reason: "a placement cannot move to another collector".to_string(),
                }
                .into());
            }
        }

        let (kept_type, kept_suppliers, kept_statistics) = match &existing {
            Some(current) => (
                vec![current.type_id],
                current.supplier_ids.clone(),
                current.statistic_ids.clone(),
            ),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        ensure_selectable(&mut *tx, Choice::Type, &[draft.type_id], &kept_type).await?;
        ensure_selectable(&mut *tx, Choice::Supplier, &draft.supplier_ids, &kept_suppliers).await?;
        ensure_selectable(&mut *tx, Choice::Statistic, &draft.statistic_ids, &kept_statistics)
            .await?;

        let id = draft.id.unwrap_or_else(Uuid::new_v4);
        debug!(
            placement_id = %id,
            collector_id = %draft.collector_id,
            suppliers = draft.supplier_ids.len(),
            statistics = draft.statistic_ids.len(),
            copies = draft.copies.len(),
            "Persisting placement"
        );

        sqlx::query(
            r#"
            INSERT INTO placements (id, collector_id, type_id)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET type_id = excluded.type_id
            "#,
        )
        .bind(id.to_string())
        .bind(draft.collector_id.to_string())
        .bind(draft.type_id.to_string())
        .execute(&mut *tx)
        .await?;

        replace_links(&mut *tx, SUPPLIER_LINKS, id, &draft.supplier_ids).await?;
        replace_links(&mut *tx, STATISTIC_LINKS, id, &draft.statistic_ids).await?;

        sqlx::query("DELETE FROM copies WHERE placement_id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        for text in &draft.copies {
            sqlx::query("INSERT INTO copies (id, text, placement_id) VALUES (?1, ?2, ?3)")
                .bind(Uuid::new_v4().to_string())
                .bind(text)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        let placement = get_in(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Placement", id))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(placement)
    }

    /// Deletes a placement (links and copies cascade). Returns the owning
    /// collector id.
    pub async fn delete(&self, id: Uuid) -> DbResult<Uuid> {
        let placement = self.require(id).await?;

        debug!(placement_id = %id, collector_id = %placement.collector_id, "Deleting placement");

        sqlx::query("DELETE FROM placements WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(placement.collector_id)
    }
}

// =============================================================================
// Linked dictionaries
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Choice {
    Type,
    Supplier,
    Statistic,
}

impl Choice {
    const fn label(self) -> &'static str {
        match self {
            Choice::Type => "PlacementType",
            Choice::Supplier => "Supplier",
            Choice::Statistic => "Statistic",
        }
    }

    const fn lookup_sql(self) -> &'static str {
        match self {
            Choice::Type => "SELECT name, is_active FROM placement_types WHERE id = ?1",
            Choice::Supplier => "SELECT name, is_active FROM suppliers WHERE id = ?1",
            Choice::Statistic => "SELECT name, is_active FROM statistics WHERE id = ?1",
        }
    }
}

/// `(delete, insert)` statements for a link table.
type LinkSql = (&'static str, &'static str);

const SUPPLIER_LINKS: LinkSql = (
    "DELETE FROM placement_suppliers WHERE placement_id = ?1",
    "INSERT INTO placement_suppliers (placement_id, supplier_id) VALUES (?1, ?2)",
);

const STATISTIC_LINKS: LinkSql = (
    "DELETE FROM placement_statistics WHERE placement_id = ?1",
    "INSERT INTO placement_statistics (placement_id, statistic_id) VALUES (?1, ?2)",
);

/// Every id must exist; ids not in `kept` must also be active.
async fn ensure_selectable(
    conn: &mut SqliteConnection,
    choice: Choice,
    ids: &[Uuid],
    kept: &[Uuid],
) -> DbResult<()> {
    for id in ids {
        let found: Option<(String, bool)> = sqlx::query_as(choice.lookup_sql())
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

        match found {
            None => return Err(DbError::not_found(choice.label(), id)),
            Some((name, false)) if !kept.contains(id) => {
                return Err(ValidationError::Inactive {
                    entity: choice.label().to_string(),
                    name,
                }
                .into())
            }
            Some(_) => {}
        }
    }
    Ok(())
}

async fn replace_links(
    conn: &mut SqliteConnection,
    (delete_sql, insert_sql): LinkSql,
    placement_id: Uuid,
    ids: &[Uuid],
) -> DbResult<()> {
    sqlx::query(delete_sql)
        .bind(placement_id.to_string())
        .execute(&mut *conn)
        .await?;

    for id in ids {
        sqlx::query(insert_sql)
            .bind(placement_id.to_string())
            .bind(id.to_string())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

// =============================================================================
// Loading
// =============================================================================

pub(crate) async fn list_in(
    conn: &mut SqliteConnection,
    collector_id: Uuid,
) -> DbResult<Vec<Placement>> {
    let rows = sqlx::query_as::<_, PlacementRow>(
        "SELECT id, collector_id, type_id FROM placements WHERE collector_id = ?1 ORDER BY rowid",
    )
    .bind(collector_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    let mut placements = Vec::with_capacity(rows.len());
    for row in rows {
        placements.push(load(&mut *conn, row).await?);
    }
    Ok(placements)
}

pub(crate) async fn get_in(conn: &mut SqliteConnection, id: Uuid) -> DbResult<Option<Placement>> {
    let row = sqlx::query_as::<_, PlacementRow>(
        "SELECT id, collector_id, type_id FROM placements WHERE id = ?1",
    )
    .bind(id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(load(conn, row).await?)),
        None => Ok(None),
    }
}

/// Suppliers and statistics come back ordered by name, copies by text.
async fn load(conn: &mut SqliteConnection, row: PlacementRow) -> DbResult<Placement> {
    let supplier_ids: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT s.id FROM placement_suppliers ps
        JOIN suppliers s ON s.id = ps.supplier_id
        WHERE ps.placement_id = ?1
        ORDER BY s.name_key
        "#,
    )
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?;

    let statistic_ids: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT s.id FROM placement_statistics ps
        JOIN statistics s ON s.id = ps.statistic_id
        WHERE ps.placement_id = ?1
        ORDER BY s.name_key
        "#,
    )
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?;

    let copies = sqlx::query_as::<_, CopyRow>(
        "SELECT id, text, placement_id FROM copies WHERE placement_id = ?1 ORDER BY text, id",
    )
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(AdCopy::try_from)
    .collect::<DbResult<Vec<_>>>()?;

    Ok(Placement {
        id: parse_id(TABLE, &row.id)?,
        collector_id: parse_id(TABLE, &row.collector_id)?,
        type_id: parse_id(TABLE, &row.type_id)?,
        supplier_ids: supplier_ids
            .iter()
            .map(|raw| parse_id("placement_suppliers", raw))
            .collect::<DbResult<_>>()?,
        statistic_ids: statistic_ids
            .iter()
            .map(|raw| parse_id("placement_statistics", raw))
            .collect::<DbResult<_>>()?,
        copies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use statdesk_core::{DictionaryDraft, DictionaryKind, SupplierDraft};

    #[tokio::test]
    async fn test_persist_writes_links_and_sorted_copies() {
        let db = test_db().await;
        let collector = collector(&db, "Spring").await;
        let placement = placement(&db, collector.id, "web").await;

        assert_eq!(placement.collector_id, collector.id);
        assert_eq!(placement.supplier_ids.len(), 1);
        assert_eq!(placement.statistic_ids.len(), 1);
        let texts: Vec<_> = placement.copies.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["A copy", "B copy"]);

        assert_eq!(db.placements().require(placement.id).await.unwrap(), placement);
    }

    #[tokio::test]
    async fn test_update_replaces_copies_and_links() {
        let db = test_db().await;
        let collector = collector(&db, "Spring").await;
        let placement = placement(&db, collector.id, "web").await;
        let extra = supplier(&db, "Extra").await;

        let updated = db
            .placements()
            .persist(&PlacementDraft {
                id: Some(placement.id),
                collector_id: collector.id,
                type_id: placement.type_id,
                supplier_ids: vec![placement.supplier_ids[0], extra.id],
                statistic_ids: vec![],
                copies: vec!["Only copy".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(updated.id, placement.id);
        assert_eq!(updated.supplier_ids.len(), 2);
        assert!(updated.statistic_ids.is_empty());
        assert_eq!(updated.copies.len(), 1);
        assert_eq!(updated.copies[0].text, "Only copy");

        let copies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM copies")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(copies, 1);
    }

    #[tokio::test]
    async fn test_inactive_choices_rejected_only_when_new() {
        let db = test_db().await;
        let collector = collector(&db, "Spring").await;
        let placement = placement(&db, collector.id, "web").await;

        // Deactivate the linked supplier: the existing link survives an update.
        let linked = db.suppliers().require(placement.supplier_ids[0]).await.unwrap();
        db.suppliers()
            .update(
                linked.id,
                &SupplierDraft {
                    name: linked.name.clone(),
                    email: linked.email.clone(),
                    is_active: false,
                },
            )
            .await
            .unwrap();

        let resave = PlacementDraft {
            id: Some(placement.id),
            collector_id: collector.id,
            type_id: placement.type_id,
            supplier_ids: placement.supplier_ids.clone(),
            statistic_ids: placement.statistic_ids.clone(),
            copies: vec!["A copy".to_string()],
        };
        db.placements().persist(&resave).await.unwrap();

        // A new placement cannot pick it.
        let err = db
            .placements()
            .persist(&PlacementDraft { id: None, ..resave })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Inactive { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_references_rejected() {
        let db = test_db().await;
        let collector = collector(&db, "Spring").await;
        let banner = db
            .dictionary(DictionaryKind::PlacementType)
            .insert(&DictionaryDraft {
                name: "Banner".to_string(),
                is_active: true,
            })
            .await
            .unwrap();

        let draft = PlacementDraft {
            id: None,
            collector_id: collector.id,
            type_id: banner.id,
            supplier_ids: vec![Uuid::new_v4()],
            statistic_ids: vec![],
            copies: vec![],
        };
        assert!(matches!(
            db.placements().persist(&draft).await,
            Err(DbError::NotFound { .. })
        ));

        let orphan = PlacementDraft {
            collector_id: Uuid::new_v4(),
            supplier_ids: vec![],
            ..draft
        };
        assert!(matches!(
            db.placements().persist(&orphan).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(db
            .placements()
            .list_for_collector(collector.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_in_creation_order_and_delete() {
        let db = test_db().await;
        let collector = collector(&db, "Spring").await;
        let first = placement(&db, collector.id, "web").await;
        let second = placement(&db, collector.id, "print").await;

        let ids: Vec<_> = db
            .placements()
            .list_for_collector(collector.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, [first.id, second.id]);

        let owner = db.placements().delete(first.id).await.unwrap();
        assert_eq!(owner, collector.id);
        assert_eq!(
            db.placements()
                .list_for_collector(collector.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}

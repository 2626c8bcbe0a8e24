//! # Dictionary Repository
//!
//! Clients, statistics and placement types share one table shape and one
//! repository, parameterised by [`DictionaryKind`].
//!
//! ## Delete Protection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kind            referenced by                     on delete           │
//! │  ─────────────   ───────────────────────────────   ─────────────────   │
//! │  Client          collectors.client_id              InUse if count > 0  │
//! │  Statistic       placement_statistics.statistic_id InUse if count > 0  │
//! │  PlacementType   placements.type_id                InUse if count > 0  │
//! │                                                                         │
//! │  The schema enforces the same rule with ON DELETE RESTRICT.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use statdesk_core::validation::{name_key, validate_dictionary_draft};
use statdesk_core::{DictionaryDraft, DictionaryEntry, DictionaryKind, ValidationError};
use tracing::debug;
use uuid::Uuid;

use super::{count_references, ensure_name_free, parse_id};
use crate::error::{DbError, DbResult};

/// Table backing a dictionary kind.
pub(crate) const fn table(kind: DictionaryKind) -> &'static str {
    match kind {
        DictionaryKind::Client => "clients",
        DictionaryKind::Statistic => "statistics",
        DictionaryKind::PlacementType => "placement_types",
    }
}

/// `(count query, what the rows are called)` for the delete guard.
const fn references(kind: DictionaryKind) -> (&'static str, &'static str) {
    match kind {
        DictionaryKind::Client => (
            "SELECT COUNT(*) FROM collectors WHERE client_id = ?1",
            "collectors",
        ),
        DictionaryKind::Statistic => (
            "SELECT COUNT(*) FROM placement_statistics WHERE statistic_id = ?1",
            "placements",
        ),
        DictionaryKind::PlacementType => (
            "SELECT COUNT(*) FROM placements WHERE type_id = ?1",
            "placements",
        ),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DictionaryRow {
    id: String,
    name: String,
    is_active: bool,
}

impl DictionaryRow {
    fn into_entry(self, kind: DictionaryKind) -> DbResult<DictionaryEntry> {
        Ok(DictionaryEntry {
            id: parse_id(table(kind), &self.id)?,
            name: self.name,
            is_active: self.is_active,
        })
    }
}

/// Repository for one dictionary kind.
///
/// ## Usage
/// ```rust,ignore
/// let clients = db.dictionary(DictionaryKind::Client);
/// let acme = clients.insert(&DictionaryDraft { name: "Acme".into(), is_active: true }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DictionaryRepository {
    pool: SqlitePool,
    kind: DictionaryKind,
}

impl DictionaryRepository {
    /// Creates a new DictionaryRepository.
    pub fn new(pool: SqlitePool, kind: DictionaryKind) -> Self {
        DictionaryRepository { pool, kind }
    }

    pub fn kind(&self) -> DictionaryKind {
        self.kind
    }

    /// Lists all entries: active first, then by case-insensitive name.
    pub async fn list(&self) -> DbResult<Vec<DictionaryEntry>> {
        let sql = format!(
            "SELECT id, name, is_active FROM {} ORDER BY is_active DESC, name_key ASC",
            table(self.kind)
        );
        self.fetch(&sql).await
    }

    /// Lists active entries only, by case-insensitive name.
    pub async fn list_active(&self) -> DbResult<Vec<DictionaryEntry>> {
        let sql = format!(
            "SELECT id, name, is_active FROM {} WHERE is_active = 1 ORDER BY name_key ASC",
            table(self.kind)
        );
        self.fetch(&sql).await
    }

    async fn fetch(&self, sql: &str) -> DbResult<Vec<DictionaryEntry>> {
        sqlx::query_as::<_, DictionaryRow>(sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.into_entry(self.kind))
            .collect()
    }

    /// Gets an entry by ID.
    pub async fn get(&self, id: Uuid) -> DbResult<Option<DictionaryEntry>> {
        let sql = format!(
            "SELECT id, name, is_active FROM {} WHERE id = ?1",
            table(self.kind)
        );
        sqlx::query_as::<_, DictionaryRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.into_entry(self.kind))
            .transpose()
    }

    /// Gets an entry by ID or fails with `NotFound`.
    pub async fn require(&self, id: Uuid) -> DbResult<DictionaryEntry> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found(self.kind.label(), id))
    }

    /// Inserts a new entry.
    ///
    /// ## Errors
    /// - `Validation(Duplicate)` when the name is taken (case-insensitive)
    /// - `Validation(Required | TooLong)` for bad names
    pub async fn insert(&self, draft: &DictionaryDraft) -> DbResult<DictionaryEntry> {
        let draft = validate_dictionary_draft(draft)?;
        let key = name_key(&draft.name);
        let table = table(self.kind);

        ensure_name_free(&self.pool, table, &draft.name, &key, None).await?;

        let entry = DictionaryEntry {
            id: Uuid::new_v4(),
            name: draft.name,
            is_active: draft.is_active,
        };

        debug!(kind = table, id = %entry.id, name = %entry.name, "Inserting dictionary entry");

        let sql = format!("INSERT INTO {table} (id, name, name_key, is_active) VALUES (?1, ?2, ?3, ?4)");
        sqlx::query(&sql)
            .bind(entry.id.to_string())
            .bind(&entry.name)
            .bind(&key)
            .bind(entry.is_active)
            .execute(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Updates name and active flag of an existing entry.
    pub async fn update(&self, id: Uuid, draft: &DictionaryDraft) -> DbResult<DictionaryEntry> {
        let draft = validate_dictionary_draft(draft)?;
        let key = name_key(&draft.name);
        let table = table(self.kind);

        self.require(id).await?;
        ensure_name_free(&self.pool, table, &draft.name, &key, Some(id)).await?;

        debug!(kind = table, id = %id, name = %draft.name, "Updating dictionary entry");

        let sql = format!("UPDATE {table} SET name = ?2, name_key = ?3, is_active = ?4 WHERE id = ?1");
        sqlx::query(&sql)
            .bind(id.to_string())
            .bind(&draft.name)
            .bind(&key)
            .bind(draft.is_active)
            .execute(&self.pool)
            .await?;

        Ok(DictionaryEntry {
            id,
            name: draft.name,
            is_active: draft.is_active,
        })
    }

    /// Deletes an entry that nothing references.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown ID
    /// - `Validation(InUse)` while referenced
    pub async fn delete(&self, id: Uuid) -> DbResult<()> {
        let entry = self.require(id).await?;
        let (count_sql, referenced_by) = references(self.kind);

        let count = count_references(&self.pool, count_sql, id).await?;
        if count > 0 {
            return Err(ValidationError::InUse {
                entity: self.kind.label().to_string(),
                name: entry.name,
                referenced_by: referenced_by.to_string(),
                count,
            }
            .into());
        }

        debug!(kind = table(self.kind), id = %id, "Deleting dictionary entry");

        let sql = format!("DELETE FROM {} WHERE id = ?1", table(self.kind));
        sqlx::query(&sql)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;

    fn draft(name: &str, is_active: bool) -> DictionaryDraft {
        DictionaryDraft {
            name: name.to_string(),
            is_active,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let clients = db.dictionary(DictionaryKind::Client);

        let acme = clients.insert(&draft("  Acme ", true)).await.unwrap();
        assert_eq!(acme.name, "Acme");

        let fetched = clients.get(acme.id).await.unwrap().unwrap();
        assert_eq!(fetched, acme);
        assert!(clients.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_names_unique_case_insensitive() {
        let db = test_db().await;
        let stats = db.dictionary(DictionaryKind::Statistic);

        stats.insert(&draft("Clicks", true)).await.unwrap();
        let err = stats.insert(&draft("CLICKS", true)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Duplicate { .. })
        ));

        // Same name in another kind is fine.
        db.dictionary(DictionaryKind::PlacementType)
            .insert(&draft("Clicks", true))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_keeps_own_name() {
        let db = test_db().await;
        let clients = db.dictionary(DictionaryKind::Client);

        let acme = clients.insert(&draft("Acme", true)).await.unwrap();
        let renamed = clients.update(acme.id, &draft("ACME", false)).await.unwrap();
        assert_eq!(renamed.name, "ACME");
        assert!(!renamed.is_active);

        let other = clients.insert(&draft("Globex", true)).await.unwrap();
        assert!(clients.update(other.id, &draft("acme", true)).await.is_err());
        assert!(matches!(
            clients.update(Uuid::new_v4(), &draft("Nobody", true)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_orders_active_first() {
        let db = test_db().await;
        let types = db.dictionary(DictionaryKind::PlacementType);

        types.insert(&draft("banner", false)).await.unwrap();
        types.insert(&draft("Video", true)).await.unwrap();
        types.insert(&draft("audio", true)).await.unwrap();

        let names: Vec<_> = types.list().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["audio", "Video", "banner"]);

        let active: Vec<_> = types
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(active, ["audio", "Video"]);
    }

    #[tokio::test]
    async fn test_referenced_entries_cannot_be_deleted() {
        let db = test_db().await;
        let collector = collector(&db, "Spring").await;
        let placement = placement(&db, collector.id, "web").await;

        let types = db.dictionary(DictionaryKind::PlacementType);
        let err = types.delete(placement.type_id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::InUse { count: 1, .. })
        ));

        let stats = db.dictionary(DictionaryKind::Statistic);
        assert!(stats.delete(placement.statistic_ids[0]).await.is_err());

        let clients = db.dictionary(DictionaryKind::Client);
        let err = clients.delete(collector.client_id).await.unwrap_err();
        assert!(err.to_string().contains("used by 1 collectors"));
    }

    #[tokio::test]
    async fn test_unreferenced_entry_deleted() {
        let db = test_db().await;
        let stats = db.dictionary(DictionaryKind::Statistic);

        let views = stats.insert(&draft("Views", true)).await.unwrap();
        stats.delete(views.id).await.unwrap();
        assert!(stats.get(views.id).await.unwrap().is_none());

        assert!(matches!(
            stats.delete(views.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}

//! # Supplier Repository
//!
//! Suppliers are dictionary entries with an email. The remote service mails
//! reminders to that address, so the email is validated on every write.

use sqlx::SqlitePool;
use statdesk_core::validation::{name_key, validate_supplier_draft};
use statdesk_core::{Supplier, SupplierDraft, ValidationError};
use tracing::debug;
use uuid::Uuid;

use super::{count_references, ensure_name_free, parse_id};
use crate::error::{DbError, DbResult};

const TABLE: &str = "suppliers";

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: String,
    name: String,
    email: String,
    is_active: bool,
}

impl TryFrom<SupplierRow> for Supplier {
    type Error = DbError;

    fn try_from(row: SupplierRow) -> DbResult<Self> {
        Ok(Supplier {
            id: parse_id(TABLE, &row.id)?,
            name: row.name,
            email: row.email,
            is_active: row.is_active,
        })
    }
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists all suppliers: active first, then by case-insensitive name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        sqlx::query_as::<_, SupplierRow>(
            r#"
            SELECT id, name, email, is_active
            FROM suppliers
            ORDER BY is_active DESC, name_key ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Supplier::try_from)
        .collect()
    }

    /// Lists active suppliers, by case-insensitive name.
    pub async fn list_active(&self) -> DbResult<Vec<Supplier>> {
        sqlx::query_as::<_, SupplierRow>(
            r#"
            SELECT id, name, email, is_active
            FROM suppliers
            WHERE is_active = 1
            ORDER BY name_key ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Supplier::try_from)
        .collect()
    }

    /// Gets a supplier by ID.
    pub async fn get(&self, id: Uuid) -> DbResult<Option<Supplier>> {
        sqlx::query_as::<_, SupplierRow>(
            "SELECT id, name, email, is_active FROM suppliers WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .map(Supplier::try_from)
        .transpose()
    }

    /// Gets a supplier by ID or fails with `NotFound`.
    pub async fn require(&self, id: Uuid) -> DbResult<Supplier> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Inserts a new supplier.
    pub async fn insert(&self, draft: &SupplierDraft) -> DbResult<Supplier> {
        let draft = validate_supplier_draft(draft)?;
        let key = name_key(&draft.name);

        ensure_name_free(&self.pool, TABLE, &draft.name, &key, None).await?;

        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: draft.name,
            email: draft.email,
            is_active: draft.is_active,
        };

        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, name_key, email, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(supplier.id.to_string())
        .bind(&supplier.name)
        .bind(&key)
        .bind(&supplier.email)
        .bind(supplier.is_active)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Updates an existing supplier.
    pub async fn update(&self, id: Uuid, draft: &SupplierDraft) -> DbResult<Supplier> {
        let draft = validate_supplier_draft(draft)?;
        let key = name_key(&draft.name);

        self.require(id).await?;
        ensure_name_free(&self.pool, TABLE, &draft.name, &key, Some(id)).await?;

        debug!(id = %id, name = %draft.name, "Updating supplier");

        sqlx::query(
            r#"
            UPDATE suppliers
            SET name = ?2, name_key = ?3, email = ?4, is_active = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .bind(&draft.name)
        .bind(&key)
        .bind(&draft.email)
        .bind(draft.is_active)
        .execute(&self.pool)
        .await?;

        Ok(Supplier {
            id,
            name: draft.name,
            email: draft.email,
            is_active: draft.is_active,
        })
    }

    /// Deletes a supplier no placement links to.
    pub async fn delete(&self, id: Uuid) -> DbResult<()> {
        let supplier = self.require(id).await?;

        let count = count_references(
            &self.pool,
            "SELECT COUNT(*) FROM placement_suppliers WHERE supplier_id = ?1",
            id,
        )
        .await?;
        if count > 0 {
            return Err(ValidationError::InUse {
                entity: "Supplier".to_string(),
                name: supplier.name,
                referenced_by: "placements".to_string(),
                count,
            }
            .into());
        }

        debug!(id = %id, "Deleting supplier");

        sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;

    fn draft(name: &str, email: &str) -> SupplierDraft {
        SupplierDraft {
            name: name.to_string(),
            email: email.to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_insert_validates_email() {
        let db = test_db().await;
        let suppliers = db.suppliers();

        let media = suppliers
            .insert(&draft("Media House", " ads@media.house "))
            .await
            .unwrap();
        assert_eq!(media.email, "ads@media.house");

        let err = suppliers
            .insert(&draft("Broken", "not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::InvalidFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        let suppliers = db.suppliers();

        suppliers.insert(&draft("Media", "a@media.io")).await.unwrap();
        assert!(suppliers.insert(&draft("mEdIa", "b@media.io")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_guarded_by_placements() {
        let db = test_db().await;
        let collector = collector(&db, "Spring").await;
        let placement = placement(&db, collector.id, "web").await;
        let linked = placement.supplier_ids[0];

        let err = db.suppliers().delete(linked).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::InUse { .. })
        ));

        db.placements().delete(placement.id).await.unwrap();
        db.suppliers().delete(linked).await.unwrap();
        assert!(db.suppliers().get(linked).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_list() {
        let db = test_db().await;
        let suppliers = db.suppliers();

        let a = suppliers.insert(&draft("Alpha", "a@x.io")).await.unwrap();
        suppliers.insert(&draft("beta", "b@x.io")).await.unwrap();

        suppliers
            .update(
                a.id,
                &SupplierDraft {
                    is_active: false,
                    ..draft("Alpha", "alpha@x.io")
                },
            )
            .await
            .unwrap();

        let all = suppliers.list().await.unwrap();
        assert_eq!(all[0].name, "beta");
        assert_eq!(all[1].email, "alpha@x.io");
        assert_eq!(suppliers.list_active().await.unwrap().len(), 1);
    }
}

//! # Purchase Repository
//!
//! Database operations for purchase documents and their detail lines.
//!
//! Headers and details are persisted together and loaded together; a
//! detail row never outlives its parent (ON DELETE CASCADE). Status
//! changes are guarded UPDATEs: the WHERE clause pins the expected current
//! status, so a transition raced by another writer changes no row and
//! surfaces `DbError::Conflict` instead of silently double-applying.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{Purchase, PurchaseDetail, PurchaseStatus};

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

const HEADER_COLUMNS: &str = "\
    id, store_id, supplier_id, user_id, \
    document_number, document_type, purchase_date, \
    subtotal_cents, tax_cents, discount_cents, total_cents, \
    status, notes, registered_at, updated_at";

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    // ===== Reads =====

    /// Gets a purchase with its detail lines, in document order.
    pub async fn find_by_id(&self, store_id: &str, id: &str) -> DbResult<Option<Purchase>> {
        let mut conn = self.pool.acquire().await?;
        self.fetch(&mut conn, store_id, id).await
    }

    /// Gets a purchase on the caller's connection (for use inside a
    /// transaction).
    pub async fn fetch(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
    ) -> DbResult<Option<Purchase>> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM purchases WHERE store_id = ?1 AND id = ?2"
        );
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(store_id)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match purchase {
            None => Ok(None),
            Some(mut purchase) => {
                purchase.details = self.fetch_details(conn, id).await?;
                Ok(Some(purchase))
            }
        }
    }

    /// Loads the detail lines for a purchase, in document order.
    async fn fetch_details(
        &self,
        conn: &mut SqliteConnection,
        purchase_id: &str,
    ) -> DbResult<Vec<PurchaseDetail>> {
        let details = sqlx::query_as::<_, PurchaseDetail>(
            "SELECT id, purchase_id, product_id, line_no, quantity, unit_price_cents, discount_cents \
             FROM purchase_details WHERE purchase_id = ?1 ORDER BY line_no",
        )
        .bind(purchase_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(details)
    }

    /// Lists purchases for a store, newest first, details included.
    pub async fn list(&self, store_id: &str, limit: u32) -> DbResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM purchases \
             WHERE store_id = ?1 ORDER BY registered_at DESC LIMIT ?2"
        );
        let mut purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(store_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut conn = self.pool.acquire().await?;
        for purchase in &mut purchases {
            let id = purchase.id.clone();
            purchase.details = self.fetch_details(&mut conn, &id).await?;
        }

        Ok(purchases)
    }

    /// Checks whether a document number is already taken within a store.
    pub async fn document_number_exists(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        document_number: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM purchases WHERE store_id = ?1 AND document_number = ?2",
        )
        .bind(store_id)
        .bind(document_number)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count > 0)
    }

    // ===== Mutations (caller's connection required) =====

    /// Inserts a purchase with its detail lines.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - document number taken in this store
    /// * `Err(DbError::ForeignKeyViolation)` - a referenced row is missing
    pub async fn insert(&self, conn: &mut SqliteConnection, purchase: &Purchase) -> DbResult<()> {
        debug!(
            id = %purchase.id,
            store_id = %purchase.store_id,
            lines = purchase.details.len(),
            "Inserting purchase"
        );

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, store_id, supplier_id, user_id,
                document_number, document_type, purchase_date,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                status, notes, registered_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15
            )
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.store_id)
        .bind(&purchase.supplier_id)
        .bind(&purchase.user_id)
        .bind(&purchase.document_number)
        .bind(purchase.document_type)
        .bind(purchase.purchase_date)
        .bind(purchase.subtotal_cents)
        .bind(purchase.tax_cents)
        .bind(purchase.discount_cents)
        .bind(purchase.total_cents)
        .bind(purchase.status)
        .bind(&purchase.notes)
        .bind(purchase.registered_at)
        .bind(purchase.updated_at)
        .execute(&mut *conn)
        .await?;

        for detail in &purchase.details {
            sqlx::query(
                r#"
                INSERT INTO purchase_details (
                    id, purchase_id, product_id, line_no,
                    quantity, unit_price_cents, discount_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&detail.id)
            .bind(&detail.purchase_id)
            .bind(&detail.product_id)
            .bind(detail.line_no)
            .bind(detail.quantity)
            .bind(detail.unit_price_cents)
            .bind(detail.discount_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Moves a purchase from `expected` status to `new_status`.
    ///
    /// The legality of the transition was already decided by the domain
    /// layer; the guard here only detects a concurrent transition.
    pub async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
        expected: PurchaseStatus,
        new_status: PurchaseStatus,
    ) -> DbResult<()> {
        debug!(id = %id, from = %expected, to = %new_status, "Updating purchase status");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE purchases SET status = ?4, updated_at = ?5 \
             WHERE store_id = ?1 AND id = ?2 AND status = ?3",
        )
        .bind(store_id)
        .bind(id)
        .bind(expected)
        .bind(new_status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Purchase",
                id,
                format!("no longer in status '{}'", expected),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

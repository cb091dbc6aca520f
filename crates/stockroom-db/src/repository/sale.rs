//! # Sale Repository
//!
//! Database operations for sale documents and their detail lines.
//!
//! Same shape as the purchase repository, plus two operations sales alone
//! need: a PENDING-only header update and a hard delete (detail rows go
//! with the header via ON DELETE CASCADE). Both are guarded by status in
//! the WHERE clause so a sale completed by another writer between the
//! domain check and the UPDATE surfaces as `DbError::Conflict`, not as a
//! silent edit of a completed document.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{Sale, SaleDetail, SaleStatus};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

const HEADER_COLUMNS: &str = "\
    id, store_id, customer_id, user_id, \
    document_number, document_type, series, sale_date, \
    subtotal_cents, tax_cents, discount_cents, total_cents, \
    status, notes, registered_at, updated_at";

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // ===== Reads =====

    /// Gets a sale with its detail lines, in document order.
    pub async fn find_by_id(&self, store_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        self.fetch(&mut conn, store_id, id).await
    }

    /// Gets a sale on the caller's connection (for use inside a
    /// transaction).
    pub async fn fetch(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {HEADER_COLUMNS} FROM sales WHERE store_id = ?1 AND id = ?2");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(store_id)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match sale {
            None => Ok(None),
            Some(mut sale) => {
                sale.details = self.fetch_details(conn, id).await?;
                Ok(Some(sale))
            }
        }
    }

    /// Loads the detail lines for a sale, in document order.
    async fn fetch_details(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Vec<SaleDetail>> {
        let details = sqlx::query_as::<_, SaleDetail>(
            "SELECT id, sale_id, product_id, line_no, quantity, unit_price_cents, discount_cents \
             FROM sale_details WHERE sale_id = ?1 ORDER BY line_no",
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(details)
    }

    /// Lists sales for a store, newest first, details included.
    pub async fn list(&self, store_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM sales \
             WHERE store_id = ?1 ORDER BY registered_at DESC LIMIT ?2"
        );
        let mut sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(store_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut conn = self.pool.acquire().await?;
        for sale in &mut sales {
            let id = sale.id.clone();
            sale.details = self.fetch_details(&mut conn, &id).await?;
        }

        Ok(sales)
    }

    /// Checks whether a document number is already taken within a store.
    pub async fn document_number_exists(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        document_number: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales WHERE store_id = ?1 AND document_number = ?2",
        )
        .bind(store_id)
        .bind(document_number)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count > 0)
    }

    // ===== Mutations (caller's connection required) =====

    /// Inserts a sale with its detail lines.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - document number taken in this store
    /// * `Err(DbError::ForeignKeyViolation)` - a referenced row is missing
    pub async fn insert(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(
            id = %sale.id,
            store_id = %sale.store_id,
            lines = sale.details.len(),
            "Inserting sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, store_id, customer_id, user_id,
                document_number, document_type, series, sale_date,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                status, notes, registered_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.store_id)
        .bind(&sale.customer_id)
        .bind(&sale.user_id)
        .bind(&sale.document_number)
        .bind(sale.document_type)
        .bind(&sale.series)
        .bind(sale.sale_date)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(sale.registered_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        for detail in &sale.details {
            sqlx::query(
                r#"
                INSERT INTO sale_details (
                    id, sale_id, product_id, line_no,
                    quantity, unit_price_cents, discount_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&detail.id)
            .bind(&detail.sale_id)
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

    /// Moves a sale from `expected` status to `new_status`.
    ///
    /// The legality of the transition was already decided by the domain
    /// layer; the guard here only detects a concurrent transition.
    pub async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
        expected: SaleStatus,
        new_status: SaleStatus,
    ) -> DbResult<()> {
        debug!(id = %id, from = %expected, to = %new_status, "Updating sale status");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sales SET status = ?4, updated_at = ?5 \
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
                "Sale",
                id,
                format!("no longer in status '{}'", expected),
            ));
        }

        Ok(())
    }

    /// Writes the editable header fields of a PENDING sale.
    ///
    /// Values come from the already-validated domain aggregate; the status
    /// guard catches the sale having moved on under us.
    pub async fn update_header(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, "Updating sale header");

        let result = sqlx::query(
            "UPDATE sales SET customer_id = ?3, sale_date = ?4, notes = ?5, updated_at = ?6 \
             WHERE store_id = ?1 AND id = ?2 AND status = 'pending'",
        )
        .bind(&sale.store_id)
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.sale_date)
        .bind(&sale.notes)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Sale",
                &sale.id,
                "no longer pending".to_string(),
            ));
        }

        Ok(())
    }

    /// Deletes a PENDING sale; detail lines cascade.
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
    ) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query(
            "DELETE FROM sales WHERE store_id = ?1 AND id = ?2 AND status = 'pending'",
        )
        .bind(store_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Sale",
                id,
                "no longer pending".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use chrono::NaiveDate;
    use stockroom_core::{
        Customer, DocumentType, NewOrderLine, NewProduct, NewSale, Product, Sale, SaleStatus,
        Store, TaxRate, User,
    };

    struct Fixture {
        db: Database,
        store: Store,
        customer: Customer,
        user: User,
        product: Product,
    }

    async fn setup() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = Store::new("Main Street");
        let customer = Customer::new(&store.id, "Jane Doe");
        let user = User::new(&store.id, "clerk1");
        let product = Product::create(
            &store.id,
            NewProduct {
                sku: "COLA-330".to_string(),
                name: "Cola 330ml".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        db.parties().insert_store(&mut conn, &store).await.unwrap();
        db.parties()
            .insert_customer(&mut conn, &customer)
            .await
            .unwrap();
        db.parties().insert_user(&mut conn, &user).await.unwrap();
        db.products().insert(&mut conn, &product).await.unwrap();

        Fixture {
            db,
            store,
            customer,
            user,
            product,
        }
    }

    fn sample_sale(f: &Fixture, document_number: Option<&str>) -> Sale {
        Sale::create(
            &f.store.id,
            NewSale {
                customer_id: f.customer.id.clone(),
                user_id: f.user.id.clone(),
                document_number: document_number.map(|s| s.to_string()),
                document_type: DocumentType::Receipt,
                series: "B001".to_string(),
                sale_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                notes: None,
                lines: vec![NewOrderLine {
                    product_id: f.product.id.clone(),
                    quantity: 2,
                    unit_price_cents: 150,
                    discount_cents: 0,
                }],
            },
            TaxRate::from_bps(1800),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let f = setup().await;
        let sale = sample_sale(&f, Some("B001-00000042"));

        let mut conn = f.db.pool().acquire().await.unwrap();
        f.db.sales().insert(&mut conn, &sale).await.unwrap();
        drop(conn); // in-memory pool has one connection; free it for the read

        let loaded = f
            .db
            .sales()
            .find_by_id(&f.store.id, &sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.document_number.as_deref(), Some("B001-00000042"));
        assert_eq!(loaded.series, "B001");
        assert_eq!(loaded.status, SaleStatus::Pending);
        assert_eq!(loaded.details.len(), 1);
        assert_eq!(loaded.total_cents, sale.total_cents);
    }

    #[tokio::test]
    async fn test_duplicate_document_number_rejected() {
        let f = setup().await;
        let first = sample_sale(&f, Some("B001-00000001"));
        let second = sample_sale(&f, Some("B001-00000001"));

        let mut conn = f.db.pool().acquire().await.unwrap();
        f.db.sales().insert(&mut conn, &first).await.unwrap();

        let err = f.db.sales().insert(&mut conn, &second).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_status_guard_detects_concurrent_transition() {
        let f = setup().await;
        let sale = sample_sale(&f, None);

        let mut conn = f.db.pool().acquire().await.unwrap();
        f.db.sales().insert(&mut conn, &sale).await.unwrap();

        f.db.sales()
            .update_status(
                &mut conn,
                &f.store.id,
                &sale.id,
                SaleStatus::Pending,
                SaleStatus::Completed,
            )
            .await
            .unwrap();

        let err = f
            .db
            .sales()
            .update_status(
                &mut conn,
                &f.store.id,
                &sale.id,
                SaleStatus::Pending,
                SaleStatus::Cancelled,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_header_update_pending_only() {
        let f = setup().await;
        let mut sale = sample_sale(&f, None);

        let mut conn = f.db.pool().acquire().await.unwrap();
        f.db.sales().insert(&mut conn, &sale).await.unwrap();

        sale.notes = Some("walk-in".to_string());
        f.db.sales().update_header(&mut conn, &sale).await.unwrap();
        drop(conn);

        let loaded = f
            .db
            .sales()
            .find_by_id(&f.store.id, &sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.notes.as_deref(), Some("walk-in"));

        let mut conn = f.db.pool().acquire().await.unwrap();
        f.db.sales()
            .update_status(
                &mut conn,
                &f.store.id,
                &sale.id,
                SaleStatus::Pending,
                SaleStatus::Completed,
            )
            .await
            .unwrap();

        let err = f
            .db
            .sales()
            .update_header(&mut conn, &sale)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_details() {
        let f = setup().await;
        let sale = sample_sale(&f, None);

        let mut conn = f.db.pool().acquire().await.unwrap();
        f.db.sales().insert(&mut conn, &sale).await.unwrap();

        f.db.sales()
            .delete(&mut conn, &f.store.id, &sale.id)
            .await
            .unwrap();
        drop(conn);

        assert!(f
            .db
            .sales()
            .find_by_id(&f.store.id, &sale.id)
            .await
            .unwrap()
            .is_none());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_details")
            .fetch_one(f.db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_delete_refuses_completed_sale() {
        let f = setup().await;
        let sale = sample_sale(&f, None);

        let mut conn = f.db.pool().acquire().await.unwrap();
        f.db.sales().insert(&mut conn, &sale).await.unwrap();
        f.db.sales()
            .update_status(
                &mut conn,
                &f.store.id,
                &sale.id,
                SaleStatus::Pending,
                SaleStatus::Completed,
            )
            .await
            .unwrap();

        let err = f
            .db
            .sales()
            .delete(&mut conn, &f.store.id, &sale.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }
}

//! # Product Repository
//!
//! Database operations for the inventory ledger.
//!
//! ## Guarded Stock Updates
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │               Why Every Counter Mutation Is One UPDATE                 │
//! │                                                                        │
//! │  ❌ WRONG: read-modify-write at the application layer                  │
//! │     let p = find(id);            ← writer B reads the same row         │
//! │     p.current_stock -= 3;                                              │
//! │     update(p);                   ← B's write overwrites A's ("lost     │
//! │                                     update", stock goes negative)      │
//! │                                                                        │
//! │  ✅ CORRECT: relative UPDATE with the invariant in the WHERE clause    │
//! │     UPDATE products                                                    │
//! │     SET current_stock = current_stock - ?qty                           │
//! │     WHERE id = ? AND store_id = ?                                      │
//! │       AND current_stock - ?qty >= reserved_stock                       │
//! │                                                                        │
//! │     rows_affected = 0 → the guard failed → DbError::Conflict           │
//! │     and the surrounding transaction rolls back in full.                │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The domain layer (stockroom-core) has already validated the same rule
//! against its snapshot and produced a typed error if it failed; the guard
//! here only fires when a concurrent writer changed the row in between.
//!
//! Every mutation takes the caller's `&mut SqliteConnection` so the use
//! case can enlist it in one transaction. There is no pool fallback on the
//! mutating path.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let mut tx = db.begin_write().await?;
/// repo.increase_stock(&mut tx, &store_id, &product_id, 10).await?;
/// tx.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = "\
    id, store_id, sku, name, description, \
    purchase_price_cents, sale_price_cents, \
    current_stock, reserved_stock, minimum_stock, maximum_stock, \
    unit_of_measure, image_url, category_id, brand_id, \
    is_active, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // ===== Reads =====

    /// Gets a product by its ID within a store.
    ///
    /// Store-scoped: an ID belonging to another store returns `None`.
    pub async fn find_by_id(&self, store_id: &str, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        self.fetch(&mut conn, store_id, id).await
    }

    /// Gets a product by ID on the caller's connection.
    ///
    /// Use this inside a transaction so the read and the subsequent guarded
    /// update observe the same snapshot.
    pub async fn fetch(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE store_id = ?1 AND id = ?2"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(store_id)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(product)
    }

    /// Gets a product by its SKU within a store.
    pub async fn find_by_sku(&self, store_id: &str, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE store_id = ?1 AND sku = ?2"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(store_id)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products for a store, sorted by name.
    pub async fn list_active(&self, store_id: &str, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND is_active = 1 \
             ORDER BY name LIMIT ?2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(store_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists active products at or below their reorder threshold.
    ///
    /// The reorder report: everything where `current_stock <= minimum_stock`.
    pub async fn list_low_stock(&self, store_id: &str, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND is_active = 1 \
               AND current_stock <= minimum_stock \
             ORDER BY current_stock - minimum_stock, name LIMIT ?2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(store_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    // ===== Mutations (caller's connection required) =====

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists in this store
    pub async fn insert(&self, conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, store_id = %product.store_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, store_id, sku, name, description,
                purchase_price_cents, sale_price_cents,
                current_stock, reserved_stock, minimum_stock, maximum_stock,
                unit_of_measure, image_url, category_id, brand_id,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17, ?18
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.store_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.current_stock)
        .bind(product.reserved_stock)
        .bind(product.minimum_stock)
        .bind(product.maximum_stock)
        .bind(&product.unit_of_measure)
        .bind(&product.image_url)
        .bind(&product.category_id)
        .bind(&product.brand_id)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates catalog fields (name, prices, thresholds, metadata).
    ///
    /// `id`, `store_id`, `sku`, and the stock counters are deliberately not
    /// in the SET list; counters change only through the guarded methods
    /// below.
    pub async fn update(&self, conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?3,
                description = ?4,
                purchase_price_cents = ?5,
                sale_price_cents = ?6,
                minimum_stock = ?7,
                maximum_stock = ?8,
                unit_of_measure = ?9,
                image_url = ?10,
                category_id = ?11,
                brand_id = ?12,
                is_active = ?13,
                updated_at = ?14
            WHERE store_id = ?1 AND id = ?2
            "#,
        )
        .bind(&product.store_id)
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.minimum_stock)
        .bind(product.maximum_stock)
        .bind(&product.unit_of_measure)
        .bind(&product.image_url)
        .bind(&product.category_id)
        .bind(&product.brand_id)
        .bind(product.is_active)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Increases `current_stock` (purchase created, sale refunded).
    ///
    /// The WHERE clause re-checks the maximum bound so a concurrent
    /// increase cannot push the counter past it.
    pub async fn increase_stock(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
        qty: i64,
    ) -> DbResult<()> {
        debug!(id = %id, qty = %qty, "Increasing stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                current_stock = current_stock + ?3,
                updated_at = ?4
            WHERE store_id = ?1 AND id = ?2
              AND is_active = 1
              AND (maximum_stock IS NULL OR current_stock + ?3 <= maximum_stock)
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(qty)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Product",
                id,
                format!("increase by {} rejected (inactive or above maximum)", qty),
            ));
        }

        Ok(())
    }

    /// Decreases `current_stock` (sale completed, purchase cancelled).
    ///
    /// The result may not drop below `reserved_stock`: units promised to
    /// pending sales stay on the shelf.
    pub async fn decrease_stock(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
        qty: i64,
    ) -> DbResult<()> {
        debug!(id = %id, qty = %qty, "Decreasing stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                current_stock = current_stock - ?3,
                updated_at = ?4
            WHERE store_id = ?1 AND id = ?2
              AND is_active = 1
              AND current_stock - ?3 >= reserved_stock
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(qty)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Product",
                id,
                format!("decrease by {} rejected (insufficient unreserved stock)", qty),
            ));
        }

        Ok(())
    }

    /// Adjusts `reserved_stock` by a signed delta (reserve on sale
    /// creation, release on completion/cancellation).
    pub async fn adjust_reserved_stock(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting reserved stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                reserved_stock = reserved_stock + ?3,
                updated_at = ?4
            WHERE store_id = ?1 AND id = ?2
              AND is_active = 1
              AND reserved_stock + ?3 >= 0
              AND reserved_stock + ?3 <= current_stock
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Product",
                id,
                format!("reservation delta {} rejected", delta),
            ));
        }

        Ok(())
    }

    /// Overwrites `current_stock` with an absolute value (manual adjustment
    /// after a physical count).
    pub async fn set_stock(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
        value: i64,
    ) -> DbResult<()> {
        debug!(id = %id, value = %value, "Setting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                current_stock = ?3,
                updated_at = ?4
            WHERE store_id = ?1 AND id = ?2
              AND is_active = 1
              AND ?3 >= reserved_stock
              AND (maximum_stock IS NULL OR ?3 <= maximum_stock)
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(value)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Product",
                id,
                format!("set to {} rejected", value),
            ));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical order lines still reference this product; it just stops
    /// accepting mutations and drops out of active listings.
    pub async fn soft_delete(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        id: &str,
    ) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                is_active = 0,
                updated_at = ?3
            WHERE store_id = ?1 AND id = ?2
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products in a store (for diagnostics).
    pub async fn count(&self, store_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE store_id = ?1 AND is_active = 1",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

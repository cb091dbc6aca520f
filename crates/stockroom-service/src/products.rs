//! # Product Use Cases
//!
//! Catalog registration, lookups, and manual stock adjustment.
//!
//! Adjustment is the only stock mutation here; every other counter change
//! belongs to an order lifecycle in [`crate::purchases`] or
//! [`crate::sales`]. The pattern is the same everywhere: read the row in
//! the transaction, replay the change on the domain aggregate to get a
//! typed verdict, then apply it with a guarded UPDATE.

use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use stockroom_core::{NewProduct, Product};
use stockroom_db::Database;

/// Product catalog and stock-adjustment operations.
#[derive(Debug, Clone)]
pub struct ProductService {
    db: Database,
    config: ServiceConfig,
}

impl ProductService {
    /// Creates a new ProductService.
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        ProductService { db, config }
    }

    /// Registers a product in a store's catalog. Stock starts at zero;
    /// units arrive through purchases.
    ///
    /// ## Errors
    /// * `NotFound` - store does not exist
    /// * `AlreadyExists` - SKU already taken in this store
    /// * `Core` - field validation failed
    pub async fn register_product(
        &self,
        store_id: &str,
        new: NewProduct,
    ) -> ServiceResult<Product> {
        debug!(store_id = %store_id, sku = %new.sku, "register_product");

        if self.db.parties().find_store(store_id).await?.is_none() {
            return Err(ServiceError::not_found("Store", store_id));
        }

        let product = Product::create(store_id, new)?;

        if self
            .db
            .products()
            .find_by_sku(store_id, &product.sku)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists("sku", &product.sku));
        }

        let mut tx = self.db.begin_write().await?;
        self.db.products().insert(&mut tx, &product).await?;
        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %product.id, sku = %product.sku, "Product registered");
        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_product(&self, store_id: &str, id: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .find_by_id(store_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    /// Gets a product by SKU.
    pub async fn find_by_sku(&self, store_id: &str, sku: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .find_by_sku(store_id, sku)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", sku))
    }

    /// Lists active products, alphabetically.
    pub async fn list_active(&self, store_id: &str) -> ServiceResult<Vec<Product>> {
        Ok(self
            .db
            .products()
            .list_active(store_id, self.config.list_limit)
            .await?)
    }

    /// Lists products at or below their reorder threshold, most urgent
    /// first.
    pub async fn list_low_stock(&self, store_id: &str) -> ServiceResult<Vec<Product>> {
        Ok(self
            .db
            .products()
            .list_low_stock(store_id, self.config.list_limit)
            .await?)
    }

    /// Overwrites `current_stock` after a physical count.
    ///
    /// The domain aggregate replays the change first, so an illegal value
    /// (below the reservation, past the maximum, negative) comes back as a
    /// typed domain error before any row is touched.
    pub async fn adjust_stock(
        &self,
        store_id: &str,
        product_id: &str,
        new_value: i64,
    ) -> ServiceResult<Product> {
        debug!(store_id = %store_id, product_id = %product_id, new_value, "adjust_stock");

        let mut tx = self.db.begin_write().await?;

        let mut product = self
            .db
            .products()
            .fetch(&mut tx, store_id, product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        product.set_stock(new_value)?;
        self.db
            .products()
            .set_stock(&mut tx, store_id, product_id, new_value)
            .await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %product.id, sku = %product.sku, new_value, "Stock adjusted");
        Ok(product)
    }

    /// Soft-deletes a product. Existing order lines keep referencing it;
    /// it stops accepting mutations and drops out of active listings.
    pub async fn deactivate_product(&self, store_id: &str, product_id: &str) -> ServiceResult<()> {
        debug!(store_id = %store_id, product_id = %product_id, "deactivate_product");

        let mut tx = self.db.begin_write().await?;

        if self
            .db
            .products()
            .fetch(&mut tx, store_id, product_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Product", product_id));
        }

        self.db
            .products()
            .soft_delete(&mut tx, store_id, product_id)
            .await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %product_id, "Product deactivated");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{CoreError, Store};
    use stockroom_db::DbConfig;

    async fn setup() -> (ProductService, Store) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = Store::new("Main Street");
        let mut conn = db.pool().acquire().await.unwrap();
        db.parties().insert_store(&mut conn, &store).await.unwrap();
        drop(conn);

        (ProductService::new(db, ServiceConfig::default()), store)
    }

    fn cola() -> NewProduct {
        NewProduct {
            sku: "COLA-330".to_string(),
            name: "Cola 330ml".to_string(),
            sale_price_cents: 150,
            purchase_price_cents: 90,
            minimum_stock: 5,
            maximum_stock: Some(100),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let (service, store) = setup().await;

        let product = service.register_product(&store.id, cola()).await.unwrap();
        assert_eq!(product.current_stock, 0);

        let by_id = service.get_product(&store.id, &product.id).await.unwrap();
        assert_eq!(by_id.sku, "COLA-330");

        let by_sku = service.find_by_sku(&store.id, "COLA-330").await.unwrap();
        assert_eq!(by_sku.id, product.id);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_sku() {
        let (service, store) = setup().await;
        service.register_product(&store.id, cola()).await.unwrap();

        let err = service
            .register_product(&store.id, cola())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_register_unknown_store() {
        let (service, _) = setup().await;
        let err = service
            .register_product("no-such-store", cola())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Store", .. }));
    }

    #[tokio::test]
    async fn test_adjust_stock_after_count() {
        let (service, store) = setup().await;
        let product = service.register_product(&store.id, cola()).await.unwrap();

        let adjusted = service
            .adjust_stock(&store.id, &product.id, 40)
            .await
            .unwrap();
        assert_eq!(adjusted.current_stock, 40);

        let reloaded = service.get_product(&store.id, &product.id).await.unwrap();
        assert_eq!(reloaded.current_stock, 40);
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_value_past_maximum() {
        let (service, store) = setup().await;
        let product = service.register_product(&store.id, cola()).await.unwrap();

        let err = service
            .adjust_stock(&store.id, &product.id, 101)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::StockExceedsMaximum { .. })
        ));

        // Nothing written
        let reloaded = service.get_product(&store.id, &product.id).await.unwrap();
        assert_eq!(reloaded.current_stock, 0);
    }

    #[tokio::test]
    async fn test_deactivated_product_rejects_adjustment() {
        let (service, store) = setup().await;
        let product = service.register_product(&store.id, cola()).await.unwrap();

        service
            .deactivate_product(&store.id, &product.id)
            .await
            .unwrap();

        let err = service
            .adjust_stock(&store.id, &product.id, 10)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InactiveProduct { .. })
        ));
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let (service, store) = setup().await;
        let low = service.register_product(&store.id, cola()).await.unwrap();
        let healthy = service
            .register_product(
                &store.id,
                NewProduct {
                    sku: "CHIPS-200".to_string(),
                    name: "Chips 200g".to_string(),
                    minimum_stock: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // cola stays at 0 (minimum 5); chips go well above their minimum
        service
            .adjust_stock(&store.id, &healthy.id, 50)
            .await
            .unwrap();

        let listed = service.list_low_stock(&store.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, low.id);
    }
}

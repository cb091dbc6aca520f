//! # Sale Use Cases
//!
//! A sale promises stock at creation and hands it over at completion.
//!
//! ## Transaction Shape
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │  create_sale                                                           │
//! │                                                                        │
//! │  validate refs (store/customer/user)                                   │
//! │  Sale::create  (pure: totals, tax from config)                         │
//! │  BEGIN IMMEDIATE (write lock up front; concurrent sales queue)         │
//! │    per line: load product, reserve() verdict, guarded reservation      │
//! │    caller gave a number?  yes ── unique? ── use it                     │
//! │                           no ─── read correlative, format B001-0000NN  │
//! │    insert header + lines                                               │
//! │    counter used? increment it                                          │
//! │  COMMIT                                                                │
//! │                                                                        │
//! │  complete_sale        cancel_sale          refund_sale                 │
//! │    release + remove     release only         add back                  │
//! │    per line             per line             per line                  │
//! │    flip to COMPLETED    flip to CANCELLED    flip to REFUNDED          │
//! │                                                                        │
//! │  A cancelled sale keeps its number; the counter never rolls back.      │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Completion releases each line before removing it, so a fully reserved
//! shelf still satisfies the "never take promised units" guard.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use stockroom_core::{DocumentType, NewSale, Sale, SaleHeaderUpdate, SaleStatus};
use stockroom_db::{format_document_number, Database};

// =============================================================================
// Response Shapes
// =============================================================================

/// A sale as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWithDetails {
    pub id: String,
    pub store_id: String,
    pub customer_id: String,
    pub user_id: String,
    pub document_number: Option<String>,
    pub document_type: DocumentType,
    pub series: String,
    pub sale_date: NaiveDate,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub lines: Vec<SaleLine>,
}

/// One line of a sale response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    pub line_no: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub line_total_cents: i64,
}

impl From<Sale> for SaleWithDetails {
    fn from(sale: Sale) -> Self {
        let lines = sale
            .details
            .iter()
            .map(|d| SaleLine {
                product_id: d.product_id.clone(),
                line_no: d.line_no,
                quantity: d.quantity,
                unit_price_cents: d.unit_price_cents,
                discount_cents: d.discount_cents,
                line_total_cents: d.total_with_discount_cents(),
            })
            .collect();

        SaleWithDetails {
            id: sale.id,
            store_id: sale.store_id,
            customer_id: sale.customer_id,
            user_id: sale.user_id,
            document_number: sale.document_number,
            document_type: sale.document_type,
            series: sale.series,
            sale_date: sale.sale_date,
            subtotal_cents: sale.subtotal_cents,
            tax_cents: sale.tax_cents,
            discount_cents: sale.discount_cents,
            total_cents: sale.total_cents,
            status: sale.status,
            notes: sale.notes,
            registered_at: sale.registered_at,
            lines,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Sale lifecycle operations.
#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    config: ServiceConfig,
}

impl SaleService {
    /// Creates a new SaleService.
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        SaleService { db, config }
    }

    /// Registers a sale: reserves stock per line and numbers the document.
    ///
    /// An explicit document number (imports) is honored after a uniqueness
    /// check; otherwise the store's correlative counter issues one inside
    /// the same transaction, so committed numbers come out gap-free and
    /// strictly increasing per (store, document type, series).
    ///
    /// ## Errors
    /// * `NotFound` - store, customer, user, or a line's product is missing
    /// * `AlreadyExists` - explicit document number already used
    /// * `Core` - empty order, future date, inactive product, or a line
    ///   asking for more than `current_stock - reserved_stock`
    pub async fn create_sale(
        &self,
        store_id: &str,
        mut new: NewSale,
    ) -> ServiceResult<SaleWithDetails> {
        debug!(store_id = %store_id, lines = new.lines.len(), "create_sale");

        if self.db.parties().find_store(store_id).await?.is_none() {
            return Err(ServiceError::not_found("Store", store_id));
        }
        if self
            .db
            .parties()
            .find_customer(store_id, &new.customer_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Customer", &new.customer_id));
        }
        if self
            .db
            .parties()
            .find_user(store_id, &new.user_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("User", &new.user_id));
        }

        if new.series.trim().is_empty() {
            new.series = self.config.default_series.clone();
        }

        let mut sale = Sale::create(
            store_id,
            new,
            self.config.tax_rate(),
            Utc::now().date_naive(),
        )?;

        let mut tx = self.db.begin_write().await?;

        for detail in &sale.details {
            let mut product = self
                .db
                .products()
                .fetch(&mut tx, store_id, &detail.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", &detail.product_id))?;

            if !product.has_stock_available(detail.quantity) {
                return Err(stockroom_core::CoreError::InsufficientStock {
                    sku: product.sku.clone(),
                    available: product.available_stock(),
                    requested: detail.quantity,
                }
                .into());
            }
            product.reserve(detail.quantity)?;
            self.db
                .products()
                .adjust_reserved_stock(&mut tx, store_id, &detail.product_id, detail.quantity)
                .await?;
        }

        let from_counter = sale.document_number.is_none();
        match &sale.document_number {
            Some(number) => {
                if self
                    .db
                    .sales()
                    .document_number_exists(&mut tx, store_id, number)
                    .await?
                {
                    return Err(ServiceError::already_exists("documentNumber", number));
                }
            }
            None => {
                let next = self
                    .db
                    .correlatives()
                    .get_next_document_number(&mut tx, store_id, sale.document_type, &sale.series)
                    .await?;
                sale.document_number = Some(format_document_number(&sale.series, next));
            }
        }

        self.db.sales().insert(&mut tx, &sale).await?;

        if from_counter {
            self.db
                .correlatives()
                .increment_document_number(&mut tx, store_id, sale.document_type, &sale.series)
                .await?;
        }

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(
            id = %sale.id,
            document_number = sale.document_number.as_deref().unwrap_or(""),
            total_cents = sale.total_cents,
            "Sale registered"
        );
        Ok(sale.into())
    }

    /// Hands the reserved units over: per line, release the hold and take
    /// the units off the shelf, then flip the sale to COMPLETED.
    pub async fn complete_sale(
        &self,
        store_id: &str,
        sale_id: &str,
    ) -> ServiceResult<SaleWithDetails> {
        debug!(store_id = %store_id, sale_id = %sale_id, "complete_sale");

        let mut tx = self.db.begin_write().await?;

        let mut sale = self
            .db
            .sales()
            .fetch(&mut tx, store_id, sale_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))?;

        let expected = sale.status;
        sale.complete()?;

        for detail in &sale.details {
            let mut product = self
                .db
                .products()
                .fetch(&mut tx, store_id, &detail.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", &detail.product_id))?;

            // Release first: the removal guard refuses to touch held units
            product.release(detail.quantity)?;
            product.remove_stock(detail.quantity)?;

            self.db
                .products()
                .adjust_reserved_stock(&mut tx, store_id, &detail.product_id, -detail.quantity)
                .await?;
            self.db
                .products()
                .decrease_stock(&mut tx, store_id, &detail.product_id, detail.quantity)
                .await?;
        }

        self.db
            .sales()
            .update_status(&mut tx, store_id, sale_id, expected, sale.status)
            .await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %sale_id, "Sale completed");
        Ok(sale.into())
    }

    /// Abandons a pending sale: the reservations are released, the shelf
    /// count never changed, and the document keeps its number.
    pub async fn cancel_sale(
        &self,
        store_id: &str,
        sale_id: &str,
    ) -> ServiceResult<SaleWithDetails> {
        debug!(store_id = %store_id, sale_id = %sale_id, "cancel_sale");

        let mut tx = self.db.begin_write().await?;

        let mut sale = self
            .db
            .sales()
            .fetch(&mut tx, store_id, sale_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))?;

        let expected = sale.status;
        sale.cancel()?;

        for detail in &sale.details {
            let mut product = self
                .db
                .products()
                .fetch(&mut tx, store_id, &detail.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", &detail.product_id))?;

            product.release(detail.quantity)?;
            self.db
                .products()
                .adjust_reserved_stock(&mut tx, store_id, &detail.product_id, -detail.quantity)
                .await?;
        }

        self.db
            .sales()
            .update_status(&mut tx, store_id, sale_id, expected, sale.status)
            .await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %sale_id, "Sale cancelled, reservations released");
        Ok(sale.into())
    }

    /// Takes the goods of a completed sale back onto the shelf and flips
    /// the sale to REFUNDED.
    pub async fn refund_sale(
        &self,
        store_id: &str,
        sale_id: &str,
    ) -> ServiceResult<SaleWithDetails> {
        debug!(store_id = %store_id, sale_id = %sale_id, "refund_sale");

        let mut tx = self.db.begin_write().await?;

        let mut sale = self
            .db
            .sales()
            .fetch(&mut tx, store_id, sale_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))?;

        let expected = sale.status;
        sale.refund()?;

        for detail in &sale.details {
            let mut product = self
                .db
                .products()
                .fetch(&mut tx, store_id, &detail.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", &detail.product_id))?;

            product.add_stock(detail.quantity)?;
            self.db
                .products()
                .increase_stock(&mut tx, store_id, &detail.product_id, detail.quantity)
                .await?;
        }

        self.db
            .sales()
            .update_status(&mut tx, store_id, sale_id, expected, sale.status)
            .await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %sale_id, "Sale refunded, stock restored");
        Ok(sale.into())
    }

    /// Edits the header of a PENDING sale. Lines and totals are immutable
    /// after creation.
    pub async fn update_sale_header(
        &self,
        store_id: &str,
        sale_id: &str,
        update: SaleHeaderUpdate,
    ) -> ServiceResult<SaleWithDetails> {
        debug!(store_id = %store_id, sale_id = %sale_id, "update_sale_header");

        if let Some(customer_id) = &update.customer_id {
            if self
                .db
                .parties()
                .find_customer(store_id, customer_id)
                .await?
                .is_none()
            {
                return Err(ServiceError::not_found("Customer", customer_id));
            }
        }

        let mut tx = self.db.begin_write().await?;

        let mut sale = self
            .db
            .sales()
            .fetch(&mut tx, store_id, sale_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))?;

        sale.update_header(update, Utc::now().date_naive())?;
        self.db.sales().update_header(&mut tx, &sale).await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %sale_id, "Sale header updated");
        Ok(sale.into())
    }

    /// Deletes a PENDING sale outright, releasing its reservations. The
    /// consumed document number stays consumed.
    pub async fn delete_sale(&self, store_id: &str, sale_id: &str) -> ServiceResult<()> {
        debug!(store_id = %store_id, sale_id = %sale_id, "delete_sale");

        let mut tx = self.db.begin_write().await?;

        let sale = self
            .db
            .sales()
            .fetch(&mut tx, store_id, sale_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))?;

        sale.ensure_pending()?;

        for detail in &sale.details {
            let mut product = self
                .db
                .products()
                .fetch(&mut tx, store_id, &detail.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", &detail.product_id))?;

            product.release(detail.quantity)?;
            self.db
                .products()
                .adjust_reserved_stock(&mut tx, store_id, &detail.product_id, -detail.quantity)
                .await?;
        }

        self.db.sales().delete(&mut tx, store_id, sale_id).await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %sale_id, "Sale deleted");
        Ok(())
    }

    /// Gets a sale with its lines.
    pub async fn get_sale(&self, store_id: &str, sale_id: &str) -> ServiceResult<SaleWithDetails> {
        let sale = self
            .db
            .sales()
            .find_by_id(store_id, sale_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))?;

        Ok(sale.into())
    }

    /// Lists sales for a store, newest first.
    pub async fn list_sales(&self, store_id: &str) -> ServiceResult<Vec<SaleWithDetails>> {
        let sales = self.db.sales().list(store_id, self.config.list_limit).await?;
        Ok(sales.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{
        CoreError, Customer, NewOrderLine, NewProduct, Product, Store, User,
    };
    use stockroom_db::DbConfig;

    struct Fixture {
        db: Database,
        service: SaleService,
        store: Store,
        customer: Customer,
        user: User,
        product: Product,
    }

    /// Store with one product holding 20 units on the shelf.
    async fn setup() -> Fixture {
        // RUST_LOG=debug cargo test -- --nocapture shows the orchestration
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = Store::new("Main Street");
        let customer = Customer::new(&store.id, "Jane Doe");
        let user = User::new(&store.id, "clerk1");
        let product = Product::create(
            &store.id,
            NewProduct {
                sku: "COLA-330".to_string(),
                name: "Cola 330ml".to_string(),
                sale_price_cents: 150,
                ..Default::default()
            },
        )
        .unwrap();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            db.parties().insert_store(&mut conn, &store).await.unwrap();
            db.parties()
                .insert_customer(&mut conn, &customer)
                .await
                .unwrap();
            db.parties().insert_user(&mut conn, &user).await.unwrap();
            db.products().insert(&mut conn, &product).await.unwrap();
            db.products()
                .increase_stock(&mut conn, &store.id, &product.id, 20)
                .await
                .unwrap();
        }

        let service = SaleService::new(db.clone(), ServiceConfig::default());
        Fixture {
            db,
            service,
            store,
            customer,
            user,
            product,
        }
    }

    fn order(f: &Fixture, qty: i64) -> NewSale {
        NewSale {
            customer_id: f.customer.id.clone(),
            user_id: f.user.id.clone(),
            document_number: None,
            document_type: DocumentType::Receipt,
            series: "B001".to_string(),
            sale_date: Utc::now().date_naive(),
            notes: None,
            lines: vec![NewOrderLine {
                product_id: f.product.id.clone(),
                quantity: qty,
                unit_price_cents: 150,
                discount_cents: 0,
            }],
        }
    }

    async fn counters_of(f: &Fixture) -> (i64, i64) {
        let p = f
            .db
            .products()
            .find_by_id(&f.store.id, &f.product.id)
            .await
            .unwrap()
            .unwrap();
        (p.current_stock, p.reserved_stock)
    }

    #[tokio::test]
    async fn test_create_reserves_and_numbers() {
        let f = setup().await;

        let sale = f.service.create_sale(&f.store.id, order(&f, 5)).await.unwrap();
        assert_eq!(sale.status, SaleStatus::Pending);
        assert_eq!(sale.document_number.as_deref(), Some("B001-00000001"));
        // 18% on 750
        assert_eq!(sale.tax_cents, 135);
        assert_eq!(sale.total_cents, 885);

        // Shelf untouched, 5 units held
        assert_eq!(counters_of(&f).await, (20, 5));
    }

    #[tokio::test]
    async fn test_numbers_are_consecutive() {
        let f = setup().await;

        let first = f.service.create_sale(&f.store.id, order(&f, 1)).await.unwrap();
        let second = f.service.create_sale(&f.store.id, order(&f, 1)).await.unwrap();
        let third = f.service.create_sale(&f.store.id, order(&f, 1)).await.unwrap();

        assert_eq!(first.document_number.as_deref(), Some("B001-00000001"));
        assert_eq!(second.document_number.as_deref(), Some("B001-00000002"));
        assert_eq!(third.document_number.as_deref(), Some("B001-00000003"));
    }

    #[tokio::test]
    async fn test_cancelled_sale_keeps_its_number() {
        let f = setup().await;

        let first = f.service.create_sale(&f.store.id, order(&f, 1)).await.unwrap();
        f.service.cancel_sale(&f.store.id, &first.id).await.unwrap();

        // The counter does not roll back for the cancelled document
        let second = f.service.create_sale(&f.store.id, order(&f, 1)).await.unwrap();
        assert_eq!(second.document_number.as_deref(), Some("B001-00000002"));
    }

    #[tokio::test]
    async fn test_create_rejects_overcommitted_stock() {
        let f = setup().await;

        // 12 of 20 held by a first sale; 9 more cannot be promised
        f.service.create_sale(&f.store.id, order(&f, 12)).await.unwrap();
        let err = f
            .service
            .create_sale(&f.store.id, order(&f, 9))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientStock { .. })
        ));

        // Rolled back whole: reservation unchanged, no document, no number
        assert_eq!(counters_of(&f).await, (20, 12));
        assert_eq!(f.service.list_sales(&f.store.id).await.unwrap().len(), 1);
        let next = f.service.create_sale(&f.store.id, order(&f, 1)).await.unwrap();
        assert_eq!(next.document_number.as_deref(), Some("B001-00000002"));
    }

    #[tokio::test]
    async fn test_complete_moves_stock_out() {
        let f = setup().await;
        let sale = f.service.create_sale(&f.store.id, order(&f, 5)).await.unwrap();

        let completed = f.service.complete_sale(&f.store.id, &sale.id).await.unwrap();
        assert_eq!(completed.status, SaleStatus::Completed);
        assert_eq!(counters_of(&f).await, (15, 0));

        // Completing again is blocked
        let err = f
            .service
            .complete_sale(&f.store.id, &sale.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::SaleCompleted { .. })
        ));
        assert_eq!(counters_of(&f).await, (15, 0));
    }

    #[tokio::test]
    async fn test_complete_with_everything_reserved() {
        let f = setup().await;
        let sale = f.service.create_sale(&f.store.id, order(&f, 20)).await.unwrap();
        assert_eq!(counters_of(&f).await, (20, 20));

        f.service.complete_sale(&f.store.id, &sale.id).await.unwrap();
        assert_eq!(counters_of(&f).await, (0, 0));
    }

    #[tokio::test]
    async fn test_cancel_releases_without_touching_shelf() {
        let f = setup().await;
        let sale = f.service.create_sale(&f.store.id, order(&f, 5)).await.unwrap();

        let cancelled = f.service.cancel_sale(&f.store.id, &sale.id).await.unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert_eq!(counters_of(&f).await, (20, 0));

        let err = f
            .service
            .cancel_sale(&f.store.id, &sale.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::SaleCancelled { .. })
        ));
    }

    #[tokio::test]
    async fn test_refund_restores_stock() {
        let f = setup().await;
        let sale = f.service.create_sale(&f.store.id, order(&f, 5)).await.unwrap();
        f.service.complete_sale(&f.store.id, &sale.id).await.unwrap();
        assert_eq!(counters_of(&f).await, (15, 0));

        let refunded = f.service.refund_sale(&f.store.id, &sale.id).await.unwrap();
        assert_eq!(refunded.status, SaleStatus::Refunded);
        assert_eq!(counters_of(&f).await, (20, 0));

        // Refund is terminal
        let err = f
            .service
            .refund_sale(&f.store.id, &sale.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::SaleRefunded { .. })
        ));
    }

    #[tokio::test]
    async fn test_refund_requires_completion() {
        let f = setup().await;
        let sale = f.service.create_sale(&f.store.id, order(&f, 5)).await.unwrap();

        let err = f
            .service
            .refund_sale(&f.store.id, &sale.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidSaleStatus { .. })
        ));
        assert_eq!(counters_of(&f).await, (20, 5));
    }

    #[tokio::test]
    async fn test_explicit_document_number() {
        let f = setup().await;
        let mut new = order(&f, 1);
        new.document_number = Some("IMPORT-001".to_string());

        let sale = f.service.create_sale(&f.store.id, new).await.unwrap();
        assert_eq!(sale.document_number.as_deref(), Some("IMPORT-001"));

        // The counter was never touched
        let counted = f.service.create_sale(&f.store.id, order(&f, 1)).await.unwrap();
        assert_eq!(counted.document_number.as_deref(), Some("B001-00000001"));

        // Reusing the explicit number is rejected
        let mut dup = order(&f, 1);
        dup.document_number = Some("IMPORT-001".to_string());
        let err = f.service.create_sale(&f.store.id, dup).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_header_update_pending_only() {
        let f = setup().await;
        let sale = f.service.create_sale(&f.store.id, order(&f, 2)).await.unwrap();

        let updated = f
            .service
            .update_sale_header(
                &f.store.id,
                &sale.id,
                SaleHeaderUpdate {
                    notes: Some("pickup at noon".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("pickup at noon"));

        f.service.complete_sale(&f.store.id, &sale.id).await.unwrap();
        let err = f
            .service
            .update_sale_header(&f.store.id, &sale.id, SaleHeaderUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::SaleNotPending { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_releases_reservation() {
        let f = setup().await;
        let sale = f.service.create_sale(&f.store.id, order(&f, 5)).await.unwrap();
        assert_eq!(counters_of(&f).await, (20, 5));

        f.service.delete_sale(&f.store.id, &sale.id).await.unwrap();
        assert_eq!(counters_of(&f).await, (20, 0));

        let err = f.service.get_sale(&f.store.id, &sale.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_refuses_completed_sale() {
        let f = setup().await;
        let sale = f.service.create_sale(&f.store.id, order(&f, 5)).await.unwrap();
        f.service.complete_sale(&f.store.id, &sale.id).await.unwrap();

        let err = f
            .service
            .delete_sale(&f.store.id, &sale.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::SaleNotPending { .. })
        ));
        assert!(f.service.get_sale(&f.store.id, &sale.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_inactive_product_rejected() {
        let f = setup().await;
        {
            let mut conn = f.db.pool().acquire().await.unwrap();
            f.db.products()
                .soft_delete(&mut conn, &f.store.id, &f.product.id)
                .await
                .unwrap();
        }

        let err = f
            .service
            .create_sale(&f.store.id, order(&f, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InactiveProduct { .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_series_falls_back_to_config() {
        let f = setup().await;
        let mut new = order(&f, 1);
        new.series = "  ".to_string();

        let sale = f.service.create_sale(&f.store.id, new).await.unwrap();
        assert_eq!(sale.series, "B001");
        assert_eq!(sale.document_number.as_deref(), Some("B001-00000001"));
    }

    /// Concurrent registrations on a shared pool: every sale must land and
    /// the counter must stay gap-free. Runs against a file-backed database
    /// so the pool actually hands out parallel connections; the in-memory
    /// config pins everything to one connection and cannot contend.
    #[tokio::test]
    async fn test_concurrent_sales_all_commit_with_gap_free_numbers() {
        let path = std::env::temp_dir().join(format!("stockroom-test-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();

        let store = Store::new("Main Street");
        let customer = Customer::new(&store.id, "Jane Doe");
        let user = User::new(&store.id, "clerk1");
        let product = Product::create(
            &store.id,
            NewProduct {
                sku: "COLA-330".to_string(),
                name: "Cola 330ml".to_string(),
                sale_price_cents: 150,
                ..Default::default()
            },
        )
        .unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            db.parties().insert_store(&mut conn, &store).await.unwrap();
            db.parties()
                .insert_customer(&mut conn, &customer)
                .await
                .unwrap();
            db.parties().insert_user(&mut conn, &user).await.unwrap();
            db.products().insert(&mut conn, &product).await.unwrap();
            db.products()
                .increase_stock(&mut conn, &store.id, &product.id, 1000)
                .await
                .unwrap();
        }

        let service = SaleService::new(db.clone(), ServiceConfig::default());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let store_id = store.id.clone();
            let new = NewSale {
                customer_id: customer.id.clone(),
                user_id: user.id.clone(),
                document_number: None,
                document_type: DocumentType::Receipt,
                series: "B001".to_string(),
                sale_date: Utc::now().date_naive(),
                notes: None,
                lines: vec![NewOrderLine {
                    product_id: product.id.clone(),
                    quantity: 1,
                    unit_price_cents: 150,
                    discount_cents: 0,
                }],
            };
            handles.push(tokio::spawn(async move {
                service.create_sale(&store_id, new).await
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            let sale = handle.await.unwrap().unwrap();
            numbers.push(sale.document_number.unwrap());
        }
        numbers.sort();
        let expected: Vec<String> = (1..=8).map(|n| format!("B001-{:08}", n)).collect();
        assert_eq!(numbers, expected);

        let p = db
            .products()
            .find_by_id(&store.id, &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((p.current_stock, p.reserved_stock), (1000, 8));

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

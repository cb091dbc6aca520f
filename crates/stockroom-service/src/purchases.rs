//! # Purchase Use Cases
//!
//! A purchase moves stock into the store the moment it is registered; the
//! RECEIVED status is bookkeeping against the supplier document, not a
//! stock event.
//!
//! ## Transaction Shape
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │  create_purchase                       cancel_purchase                 │
//! │                                                                        │
//! │  validate refs (store/supplier/user)   BEGIN IMMEDIATE                 │
//! │  Purchase::create  (pure)                load purchase                 │
//! │  BEGIN IMMEDIATE                         cancel() on the aggregate     │
//! │    document number free?                 per line:                     │
//! │    per line:                               load product                │
//! │      load product                          remove_stock() verdict      │
//! │      add_stock() verdict                   guarded stock decrement     │
//! │      guarded stock increment             guarded status flip           │
//! │    insert header + lines               COMMIT                          │
//! │  COMMIT                                                                │
//! │                                                                        │
//! │  Any error before COMMIT rolls the whole document back: stock and      │
//! │  document always move together.                                        │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use stockroom_core::{DocumentType, NewPurchase, Purchase, PurchaseStatus};
use stockroom_db::Database;

// =============================================================================
// Response Shapes
// =============================================================================

/// A purchase as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseWithDetails {
    pub id: String,
    pub store_id: String,
    pub supplier_id: String,
    pub user_id: String,
    pub document_number: Option<String>,
    pub document_type: DocumentType,
    pub purchase_date: NaiveDate,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: PurchaseStatus,
    pub notes: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub lines: Vec<PurchaseLine>,
}

/// One line of a purchase response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub product_id: String,
    pub line_no: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub line_total_cents: i64,
}

impl From<Purchase> for PurchaseWithDetails {
    fn from(purchase: Purchase) -> Self {
        let lines = purchase
            .details
            .iter()
            .map(|d| PurchaseLine {
                product_id: d.product_id.clone(),
                line_no: d.line_no,
                quantity: d.quantity,
                unit_price_cents: d.unit_price_cents,
                discount_cents: d.discount_cents,
                line_total_cents: d.total_with_discount_cents(),
            })
            .collect();

        PurchaseWithDetails {
            id: purchase.id,
            store_id: purchase.store_id,
            supplier_id: purchase.supplier_id,
            user_id: purchase.user_id,
            document_number: purchase.document_number,
            document_type: purchase.document_type,
            purchase_date: purchase.purchase_date,
            subtotal_cents: purchase.subtotal_cents,
            tax_cents: purchase.tax_cents,
            discount_cents: purchase.discount_cents,
            total_cents: purchase.total_cents,
            status: purchase.status,
            notes: purchase.notes,
            registered_at: purchase.registered_at,
            lines,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Purchase lifecycle operations.
#[derive(Debug, Clone)]
pub struct PurchaseService {
    db: Database,
    config: ServiceConfig,
}

impl PurchaseService {
    /// Creates a new PurchaseService.
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        PurchaseService { db, config }
    }

    /// Registers a purchase and puts its goods on the shelf, atomically.
    ///
    /// ## Errors
    /// * `NotFound` - store, supplier, user, or a line's product is missing
    ///   (references from another store read the same way)
    /// * `AlreadyExists` - document number already used in this store
    /// * `Core` - a domain rule rejected the document or a stock movement
    pub async fn create_purchase(
        &self,
        store_id: &str,
        new: NewPurchase,
    ) -> ServiceResult<PurchaseWithDetails> {
        debug!(store_id = %store_id, lines = new.lines.len(), "create_purchase");

        if self.db.parties().find_store(store_id).await?.is_none() {
            return Err(ServiceError::not_found("Store", store_id));
        }
        if self
            .db
            .parties()
            .find_supplier(store_id, &new.supplier_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Supplier", &new.supplier_id));
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

        let purchase = Purchase::create(store_id, new, Utc::now().date_naive())?;

        let mut tx = self.db.begin_write().await?;

        if let Some(number) = &purchase.document_number {
            if self
                .db
                .purchases()
                .document_number_exists(&mut tx, store_id, number)
                .await?
            {
                return Err(ServiceError::already_exists("documentNumber", number));
            }
        }

        // Goods arrive at registration. The aggregate gives the typed
        // verdict; the guarded UPDATE makes it hold under concurrency.
        for detail in &purchase.details {
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

        self.db.purchases().insert(&mut tx, &purchase).await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(
            id = %purchase.id,
            total_cents = purchase.total_cents,
            lines = purchase.details.len(),
            "Purchase registered"
        );
        Ok(purchase.into())
    }

    /// Confirms the goods against the supplier document. No stock effect.
    pub async fn receive_purchase(
        &self,
        store_id: &str,
        purchase_id: &str,
    ) -> ServiceResult<PurchaseWithDetails> {
        debug!(store_id = %store_id, purchase_id = %purchase_id, "receive_purchase");

        let mut tx = self.db.begin_write().await?;

        let mut purchase = self
            .db
            .purchases()
            .fetch(&mut tx, store_id, purchase_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase", purchase_id))?;

        let expected = purchase.status;
        purchase.mark_as_received()?;
        self.db
            .purchases()
            .update_status(&mut tx, store_id, purchase_id, expected, purchase.status)
            .await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %purchase_id, "Purchase received");
        Ok(purchase.into())
    }

    /// Calls a purchase off and takes its goods back off the shelf.
    ///
    /// Fails with `InsufficientStock` when the goods have already been
    /// promised or sold on; the cancellation then does not happen at all.
    pub async fn cancel_purchase(
        &self,
        store_id: &str,
        purchase_id: &str,
    ) -> ServiceResult<PurchaseWithDetails> {
        debug!(store_id = %store_id, purchase_id = %purchase_id, "cancel_purchase");

        let mut tx = self.db.begin_write().await?;

        let mut purchase = self
            .db
            .purchases()
            .fetch(&mut tx, store_id, purchase_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase", purchase_id))?;

        let expected = purchase.status;
        purchase.cancel()?;

        for detail in &purchase.details {
            let mut product = self
                .db
                .products()
                .fetch(&mut tx, store_id, &detail.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", &detail.product_id))?;

            product.remove_stock(detail.quantity)?;
            self.db
                .products()
                .decrease_stock(&mut tx, store_id, &detail.product_id, detail.quantity)
                .await?;
        }

        self.db
            .purchases()
            .update_status(&mut tx, store_id, purchase_id, expected, purchase.status)
            .await?;

        tx.commit().await.map_err(stockroom_db::DbError::from)?;

        info!(id = %purchase_id, "Purchase cancelled, stock reversed");
        Ok(purchase.into())
    }

    /// Gets a purchase with its lines.
    pub async fn get_purchase(
        &self,
        store_id: &str,
        purchase_id: &str,
    ) -> ServiceResult<PurchaseWithDetails> {
        let purchase = self
            .db
            .purchases()
            .find_by_id(store_id, purchase_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase", purchase_id))?;

        Ok(purchase.into())
    }

    /// Lists purchases for a store, newest first.
    pub async fn list_purchases(&self, store_id: &str) -> ServiceResult<Vec<PurchaseWithDetails>> {
        let purchases = self
            .db
            .purchases()
            .list(store_id, self.config.list_limit)
            .await?;

        Ok(purchases.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

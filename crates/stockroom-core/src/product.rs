//! # Product Aggregate
//!
//! The inventory ledger entry. Every stock movement in the system ends up as
//! a mutation of the three counters on this type.
//!
//! ## Stock Counters
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                      Product Stock Counters                            │
//! │                                                                        │
//! │   current_stock   ──  physical units on the shelf                      │
//! │   reserved_stock  ──  units held for PENDING sales                     │
//! │   available       ──  current_stock - reserved_stock (derived)         │
//! │                                                                        │
//! │   Invariants (hold after every mutation):                              │
//! │     0 <= reserved_stock <= current_stock                               │
//! │     current_stock <= maximum_stock          (when a maximum is set)    │
//! │                                                                        │
//! │   Who mutates what:                                                    │
//! │     purchase create   ──► add_stock(qty)        per line               │
//! │     purchase cancel   ──► remove_stock(qty)     per line               │
//! │     sale create       ──► reserve(qty)          per line               │
//! │     sale complete     ──► release + remove      per line               │
//! │     sale cancel       ──► release(qty)          per line               │
//! │     sale refund       ──► add_stock(qty)        per line               │
//! │     manual adjustment ──► set_stock(value)                             │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same checks are repeated as `WHERE` guards on the UPDATE statements in
//! stockroom-db, so a concurrent writer cannot slip a counter past its bounds
//! between our read and our write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{
    validate_name, validate_price_cents, validate_sku, validate_stock_bounds,
};

// =============================================================================
// Product
// =============================================================================

/// A product in a store's catalog, with its live stock counters.
///
/// `id`, `store_id`, and `sku` are fixed at creation. Stock counters change
/// only through the mutation methods below; the service layer never writes
/// the fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store this product belongs to (tenant boundary).
    pub store_id: String,

    /// Stock Keeping Unit, unique within the store, immutable.
    pub sku: String,

    /// Display name.
    pub name: String,

    pub description: Option<String>,

    /// What the store pays per unit, in cents.
    pub purchase_price_cents: i64,

    /// What the store charges per unit, in cents.
    pub sale_price_cents: i64,

    /// Physical units on hand.
    pub current_stock: i64,

    /// Units held for pending sales. Never exceeds `current_stock`.
    pub reserved_stock: i64,

    /// Reorder threshold; at or below means "low stock".
    pub minimum_stock: i64,

    /// Optional storage cap; increases may not push `current_stock` past it.
    pub maximum_stock: Option<i64>,

    /// Unit label ("unit", "kg", "box").
    pub unit_of_measure: String,

    pub image_url: Option<String>,

    /// Catalog metadata references, managed outside this system.
    pub category_id: Option<String>,
    pub brand_id: Option<String>,

    /// Soft-delete flag. Inactive products reject every mutation.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a new product.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    pub minimum_stock: i64,
    pub maximum_stock: Option<i64>,
    pub unit_of_measure: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
}

impl Product {
    /// Registers a new product with empty stock.
    ///
    /// ## Rules
    /// - sku/name validated (charset, length)
    /// - prices must be >= 0
    /// - minimum_stock >= 0; maximum_stock, when set, >= minimum_stock
    /// - stock always starts at zero; units arrive through purchases
    pub fn create(store_id: impl Into<String>, new: NewProduct) -> CoreResult<Product> {
        validate_sku(&new.sku)?;
        validate_name(&new.name)?;
        validate_price_cents(new.purchase_price_cents)?;
        validate_price_cents(new.sale_price_cents)?;
        validate_stock_bounds(new.minimum_stock, new.maximum_stock)?;

        let now = Utc::now();
        Ok(Product {
            id: Uuid::new_v4().to_string(),
            store_id: store_id.into(),
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            purchase_price_cents: new.purchase_price_cents,
            sale_price_cents: new.sale_price_cents,
            current_stock: 0,
            reserved_stock: 0,
            minimum_stock: new.minimum_stock,
            maximum_stock: new.maximum_stock,
            unit_of_measure: new.unit_of_measure.unwrap_or_else(|| "unit".to_string()),
            image_url: new.image_url,
            category_id: new.category_id,
            brand_id: new.brand_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    // ===== Derived Values =====

    /// Units that can still be promised to new sales.
    #[inline]
    pub fn available_stock(&self) -> i64 {
        self.current_stock - self.reserved_stock
    }

    /// Whether `qty` more units can be promised to a new sale.
    #[inline]
    pub fn has_stock_available(&self, qty: i64) -> bool {
        self.available_stock() >= qty
    }

    /// At or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }

    /// Nothing on the shelf.
    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.current_stock == 0
    }

    /// Sale price as Money.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Purchase price as Money.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    // ===== Stock Mutations =====

    /// Adds units to the shelf (purchase received, refund restocked).
    ///
    /// ## Errors
    /// - `InvalidStock` if `qty <= 0`
    /// - `StockExceedsMaximum` if a maximum is set and would be passed
    /// - `InactiveProduct` if the product is soft-deleted
    pub fn add_stock(&mut self, qty: i64) -> CoreResult<()> {
        self.ensure_active()?;
        if qty <= 0 {
            return Err(CoreError::InvalidStock { quantity: qty });
        }

        let attempted = self.current_stock + qty;
        if let Some(maximum) = self.maximum_stock {
            if attempted > maximum {
                return Err(CoreError::StockExceedsMaximum {
                    sku: self.sku.clone(),
                    maximum,
                    attempted,
                });
            }
        }

        self.current_stock = attempted;
        self.touch();
        Ok(())
    }

    /// Removes units from the shelf (sale completed, purchase cancelled).
    ///
    /// The result may not drop below `reserved_stock`: units promised to
    /// pending sales cannot be taken by anyone else.
    ///
    /// ## Errors
    /// - `InvalidStock` if `qty <= 0`
    /// - `InsufficientStock` if `qty` exceeds `current_stock - reserved_stock`
    /// - `InactiveProduct` if the product is soft-deleted
    pub fn remove_stock(&mut self, qty: i64) -> CoreResult<()> {
        self.ensure_active()?;
        if qty <= 0 {
            return Err(CoreError::InvalidStock { quantity: qty });
        }

        if qty > self.available_stock() {
            return Err(CoreError::InsufficientStock {
                sku: self.sku.clone(),
                available: self.available_stock(),
                requested: qty,
            });
        }

        self.current_stock -= qty;
        self.touch();
        Ok(())
    }

    /// Overwrites `current_stock` with an absolute value. Used for manual
    /// adjustments after a physical count.
    ///
    /// ## Errors
    /// - `InvalidStock` if `value < 0`
    /// - `StockExceedsMaximum` if a maximum is set and `value` passes it
    /// - `InvalidReservation` if `value` would undercut `reserved_stock`
    /// - `InactiveProduct` if the product is soft-deleted
    pub fn set_stock(&mut self, value: i64) -> CoreResult<()> {
        self.ensure_active()?;
        if value < 0 {
            return Err(CoreError::InvalidStock { quantity: value });
        }

        if let Some(maximum) = self.maximum_stock {
            if value > maximum {
                return Err(CoreError::StockExceedsMaximum {
                    sku: self.sku.clone(),
                    maximum,
                    attempted: value,
                });
            }
        }

        if value < self.reserved_stock {
            return Err(CoreError::InvalidReservation {
                sku: self.sku.clone(),
                reserved: self.reserved_stock,
                current: value,
                delta: 0,
            });
        }

        self.current_stock = value;
        self.touch();
        Ok(())
    }

    /// Holds units for a pending sale.
    pub fn reserve(&mut self, qty: i64) -> CoreResult<()> {
        if qty <= 0 {
            return Err(CoreError::InvalidStock { quantity: qty });
        }
        self.adjust_reserved(qty)
    }

    /// Returns previously held units to the available pool.
    pub fn release(&mut self, qty: i64) -> CoreResult<()> {
        if qty <= 0 {
            return Err(CoreError::InvalidStock { quantity: qty });
        }
        self.adjust_reserved(-qty)
    }

    /// Adjusts `reserved_stock` by a signed delta.
    ///
    /// ## Errors
    /// - `InvalidReservation` if the result would be negative or exceed
    ///   `current_stock`
    /// - `InactiveProduct` if the product is soft-deleted
    pub fn adjust_reserved(&mut self, delta: i64) -> CoreResult<()> {
        self.ensure_active()?;

        let new_reserved = self.reserved_stock + delta;
        if new_reserved < 0 || new_reserved > self.current_stock {
            return Err(CoreError::InvalidReservation {
                sku: self.sku.clone(),
                reserved: self.reserved_stock,
                current: self.current_stock,
                delta,
            });
        }

        self.reserved_stock = new_reserved;
        self.touch();
        Ok(())
    }

    /// Soft-deletes the product. Existing order lines keep referencing it;
    /// it just stops accepting mutations and drops out of active listings.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    fn ensure_active(&self) -> CoreResult<()> {
        if !self.is_active {
            return Err(CoreError::InactiveProduct {
                sku: self.sku.clone(),
            });
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product() -> Product {
        Product::create(
            "store-1",
            NewProduct {
                sku: "COLA-330".to_string(),
                name: "Cola 330ml".to_string(),
                purchase_price_cents: 60,
                sale_price_cents: 150,
                minimum_stock: 5,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_starts_with_zero_stock() {
        let product = test_product();
        assert_eq!(product.current_stock, 0);
        assert_eq!(product.reserved_stock, 0);
        assert!(product.is_active);
        assert!(product.is_out_of_stock());
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let bad_sku = Product::create(
            "store-1",
            NewProduct {
                sku: "has space".to_string(),
                name: "X".to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(bad_sku, Err(CoreError::Validation(_))));

        let bad_bounds = Product::create(
            "store-1",
            NewProduct {
                sku: "A1".to_string(),
                name: "X".to_string(),
                minimum_stock: 10,
                maximum_stock: Some(5),
                ..Default::default()
            },
        );
        assert!(matches!(bad_bounds, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_add_stock() {
        let mut product = test_product();
        product.add_stock(10).unwrap();
        assert_eq!(product.current_stock, 10);

        assert!(matches!(
            product.add_stock(0),
            Err(CoreError::InvalidStock { quantity: 0 })
        ));
        assert!(matches!(
            product.add_stock(-5),
            Err(CoreError::InvalidStock { .. })
        ));
    }

    #[test]
    fn test_add_stock_respects_maximum() {
        let mut product = test_product();
        product.maximum_stock = Some(100);
        product.add_stock(90).unwrap();

        // 90 + 20 would pass the cap of 100
        let err = product.add_stock(20).unwrap_err();
        assert!(matches!(
            err,
            CoreError::StockExceedsMaximum {
                maximum: 100,
                attempted: 110,
                ..
            }
        ));
        assert_eq!(product.current_stock, 90);

        // Landing exactly on the cap is fine
        product.add_stock(10).unwrap();
        assert_eq!(product.current_stock, 100);
    }

    #[test]
    fn test_remove_stock() {
        let mut product = test_product();
        product.add_stock(10).unwrap();

        product.remove_stock(4).unwrap();
        assert_eq!(product.current_stock, 6);

        let err = product.remove_stock(7).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 6,
                requested: 7,
                ..
            }
        ));
    }

    #[test]
    fn test_remove_stock_cannot_take_reserved_units() {
        let mut product = test_product();
        product.add_stock(10).unwrap();
        product.reserve(3).unwrap();

        // 8 <= current_stock, but only 7 units are unreserved
        let err = product.remove_stock(8).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 7,
                requested: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_set_stock() {
        let mut product = test_product();
        product.set_stock(25).unwrap();
        assert_eq!(product.current_stock, 25);

        assert!(matches!(
            product.set_stock(-1),
            Err(CoreError::InvalidStock { .. })
        ));

        product.maximum_stock = Some(30);
        assert!(matches!(
            product.set_stock(31),
            Err(CoreError::StockExceedsMaximum { .. })
        ));

        product.reserve(10).unwrap();
        assert!(matches!(
            product.set_stock(9),
            Err(CoreError::InvalidReservation { .. })
        ));
    }

    #[test]
    fn test_reserve_and_release() {
        let mut product = test_product();
        product.add_stock(10).unwrap();

        product.reserve(6).unwrap();
        assert_eq!(product.reserved_stock, 6);
        assert_eq!(product.available_stock(), 4);

        // Cannot reserve past what is on the shelf
        assert!(matches!(
            product.reserve(5),
            Err(CoreError::InvalidReservation { .. })
        ));

        // Cannot release more than is held
        assert!(matches!(
            product.release(7),
            Err(CoreError::InvalidReservation { .. })
        ));

        product.release(6).unwrap();
        assert_eq!(product.reserved_stock, 0);
        assert_eq!(product.available_stock(), 10);
    }

    #[test]
    fn test_reserving_everything_is_allowed() {
        let mut product = test_product();
        product.add_stock(10).unwrap();
        product.reserve(10).unwrap();
        assert_eq!(product.available_stock(), 0);
        assert!(!product.has_stock_available(1));
    }

    #[test]
    fn test_low_stock_predicates() {
        let mut product = test_product();
        assert!(product.is_out_of_stock());
        assert!(product.is_low_stock());

        product.add_stock(5).unwrap();
        // minimum_stock is 5; at the threshold counts as low
        assert!(product.is_low_stock());
        assert!(!product.is_out_of_stock());

        product.add_stock(1).unwrap();
        assert!(!product.is_low_stock());
    }

    #[test]
    fn test_inactive_product_rejects_mutations() {
        let mut product = test_product();
        product.add_stock(10).unwrap();
        product.deactivate();

        assert!(matches!(
            product.add_stock(1),
            Err(CoreError::InactiveProduct { .. })
        ));
        assert!(matches!(
            product.remove_stock(1),
            Err(CoreError::InactiveProduct { .. })
        ));
        assert!(matches!(
            product.reserve(1),
            Err(CoreError::InactiveProduct { .. })
        ));
        // Counters untouched by the failed calls
        assert_eq!(product.current_stock, 10);
        assert_eq!(product.reserved_stock, 0);
    }

    #[test]
    fn test_updated_at_moves_forward_on_mutation() {
        let mut product = test_product();
        let before = product.updated_at;
        product.add_stock(1).unwrap();
        assert!(product.updated_at >= before);
    }
}

//! # Domain Types
//!
//! Shared domain types: tax rate, document kinds, and the store-scoped
//! party records referenced by orders.
//!
//! ## Type Hierarchy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                                  │
//! │                                                                        │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐          │
//! │  │     Store      │   │   Supplier     │   │   Customer     │          │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │          │
//! │  │  id (UUID)     │   │  id (UUID)     │   │  id (UUID)     │          │
//! │  │  tenant root   │   │  store_id (FK) │   │  store_id (FK) │          │
//! │  └────────────────┘   └────────────────┘   └────────────────┘          │
//! │                                                                        │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐          │
//! │  │    TaxRate     │   │ DocumentType   │   │     User       │          │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │          │
//! │  │  bps (u32)     │   │  Ticket        │   │  id (UUID)     │          │
//! │  │  1800 = 18%    │   │  Receipt       │   │  store_id (FK) │          │
//! │  └────────────────┘   │  Invoice       │   └────────────────┘          │
//! │                       └────────────────┘                               │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4, immutable, used for database relations
//! - a business identifier (sku, document number, username) that humans use
//!
//! The aggregates with behavior (Product, Purchase, Sale) live in their own
//! modules; the records here are referenced by orders but never mutated by
//! the transaction engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (a common VAT-style rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Document Type
// =============================================================================

/// The kind of commercial document an order is registered under.
///
/// Sales combine this with a series ("B001") to select the correlative
/// counter that numbers the document. Purchases carry the type of the
/// supplier's document alongside its (supplier-assigned) number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Internal ticket, no fiscal weight.
    Ticket,
    /// Simple receipt issued to an unidentified customer.
    Receipt,
    /// Full invoice issued against a tax id.
    Invoice,
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Ticket
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentType::Ticket => "ticket",
            DocumentType::Receipt => "receipt",
            DocumentType::Invoice => "invoice",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Order Line Input
// =============================================================================

/// Caller input for one order line, shared by purchase and sale creation.
///
/// Quantity, price, and discount are validated when the aggregate snapshots
/// the line into a detail row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
}

// =============================================================================
// Store
// =============================================================================

/// A store: the tenant boundary. Every other row is scoped to one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Store {
    pub id: String,
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Creates a new active store.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Store {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            tax_id: None,
            address: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier purchases are registered against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    /// Creates a new active supplier for a store.
    pub fn new(store_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Supplier {
            id: Uuid::new_v4().to_string(),
            store_id: store_id.into(),
            name: name.into(),
            tax_id: None,
            email: None,
            phone: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer sales are registered against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Creates a new active customer for a store.
    pub fn new(store_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4().to_string(),
            store_id: store_id.into(),
            name: name.into(),
            tax_id: None,
            email: None,
            phone: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// The user who registered a document. Authentication lives outside this
/// system; orders only need a valid reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub store_id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new active user for a store.
    pub fn new(store_id: impl Into<String>, username: impl Into<String>) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4().to_string(),
            store_id: store_id.into(),
            username: username.into(),
            full_name: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1800);
        assert_eq!(rate.bps(), 1800);
        assert!((rate.percentage() - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(18.0);
        assert_eq!(rate.bps(), 1800);
    }

    #[test]
    fn test_document_type_display() {
        assert_eq!(DocumentType::Ticket.to_string(), "ticket");
        assert_eq!(DocumentType::Invoice.to_string(), "invoice");
    }

    #[test]
    fn test_store_new_is_active() {
        let store = Store::new("Main Street");
        assert!(store.is_active);
        assert_eq!(store.name, "Main Street");
        assert!(!store.id.is_empty());
    }

    #[test]
    fn test_supplier_scoped_to_store() {
        let store = Store::new("Main Street");
        let supplier = Supplier::new(&store.id, "Acme Wholesale");
        assert_eq!(supplier.store_id, store.id);
    }
}

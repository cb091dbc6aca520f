//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! This crate is the **heart** of Stockroom. It holds the inventory ledger
//! rules and the order state machines as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Architecture                           │
//! │                                                                        │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 stockroom-service (Use Cases)                    │  │
//! │  │   create_sale, complete_sale, create_purchase, adjust_stock      │  │
//! │  │   One use case = one SQLite transaction                          │  │
//! │  └─────────────────────────────┬────────────────────────────────────┘  │
//! │                                │                                       │
//! │  ┌─────────────────────────────▼────────────────────────────────────┐  │
//! │  │              ★ stockroom-core (THIS CRATE) ★                     │  │
//! │  │                                                                  │  │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐            │  │
//! │  │   │ product  │ │ purchase │ │   sale   │ │  money   │            │  │
//! │  │   │ counters │ │  states  │ │  states  │ │ tax math │            │  │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘            │  │
//! │  │                                                                  │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS             │  │
//! │  └─────────────────────────────┬────────────────────────────────────┘  │
//! │                                │                                       │
//! │  ┌─────────────────────────────▼────────────────────────────────────┐  │
//! │  │                  stockroom-db (Database Layer)                   │  │
//! │  │        SQLite repositories, guarded UPDATEs, migrations          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`product`] - Product aggregate: the three stock counters and their rules
//! - [`purchase`] - Purchase aggregate: detail lines, totals, state machine
//! - [`sale`] - Sale aggregate: detail lines, totals + tax, state machine
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Shared types (TaxRate, DocumentType, party records)
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, the caller owns the clock and the ids
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), no float errors
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::product::{NewProduct, Product};
//!
//! let mut product = Product::create(
//!     "store-1",
//!     NewProduct {
//!         sku: "COLA-330".to_string(),
//!         name: "Cola 330ml".to_string(),
//!         sale_price_cents: 150,
//!         ..Default::default()
//!     },
//! )
//! .unwrap();
//!
//! product.add_stock(10).unwrap();
//! product.reserve(4).unwrap();
//! assert_eq!(product.available_stock(), 6);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockroom_core::Money` instead of
// `use stockroom_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use product::{NewProduct, Product};
pub use purchase::{NewPurchase, Purchase, PurchaseDetail, PurchaseStatus};
pub use sale::{NewSale, Sale, SaleDetail, SaleHeaderUpdate, SaleStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum detail lines in a single order document.
///
/// ## Business Reason
/// Keeps documents printable and transactions bounded. Can be made
/// configurable per store later.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single order line.
///
/// ## Business Reason
/// Catches fat-finger entries (9999 instead of 99) before they distort
/// the ledger.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum characters in a document series ("B001").
pub const MAX_SERIES_LEN: usize = 10;

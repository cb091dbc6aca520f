//! # stockroom-service: Use-Case Orchestration for Stockroom
//!
//! This crate wires the pure domain rules of `stockroom-core` to the
//! SQLite repositories of `stockroom-db`. One use case is one database
//! transaction: every stock counter, document row, and correlative
//! counter a use case touches commits together or not at all.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                      Stockroom Architecture                            │
//! │                                                                        │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │            ★ stockroom-service (THIS CRATE) ★                    │  │
//! │  │                                                                  │  │
//! │  │   ┌──────────────┐  ┌───────────────┐  ┌───────────────┐         │  │
//! │  │   │ProductService│  │PurchaseService│  │  SaleService  │         │  │
//! │  │   │ register     │  │ create        │  │ create        │         │  │
//! │  │   │ adjust_stock │  │ receive       │  │ complete      │         │  │
//! │  │   │ deactivate   │  │ cancel        │  │ cancel/refund │         │  │
//! │  │   └──────┬───────┘  └──────┬────────┘  └──────┬────────┘         │  │
//! │  │          │                │                   │                  │  │
//! │  │          └───────── one transaction each ─────┘                  │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 │                                      │
//! │        stockroom-core (rules)   │   stockroom-db (rows, guards)        │
//! └─────────────────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! ## The Double Check
//!
//! Every stock movement is decided twice. The domain aggregate replays
//! the change in memory and yields a typed error (`InsufficientStock`,
//! `StockExceedsMaximum`, ...). The repository then applies it with a
//! guarded UPDATE whose WHERE clause re-states the same bound, so a
//! concurrent writer that invalidated the in-memory verdict turns the
//! write into a `Conflict` and rolls the use case back.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//! use stockroom_service::{SaleService, ServiceConfig};
//!
//! let db = Database::new(DbConfig::new("stockroom.db")).await?;
//! let sales = SaleService::new(db, ServiceConfig::from_env());
//!
//! let sale = sales.create_sale(&store_id, new_sale).await?;
//! println!("issued {}", sale.document_number.unwrap_or_default());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod products;
pub mod purchases;
pub mod sales;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use products::ProductService;
pub use purchases::{PurchaseLine, PurchaseService, PurchaseWithDetails};
pub use sales::{SaleLine, SaleService, SaleWithDetails};

//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                          Error Types                                   │
//! │                                                                        │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Stock and order rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                        │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                        │
//! │  stockroom-service errors (separate crate)                             │
//! │  └── ServiceError     - What callers see (NotFound, AlreadyExists)     │
//! │                                                                        │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, counters, requested amounts)
//! 3. Errors are enum variants, never String
//! 4. A domain error inside a transaction aborts the whole transaction

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Stock ledger and order lifecycle errors.
///
/// These errors represent business rule violations. They carry enough context
/// to explain the rejection without another query.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stock mutation was called with a non-positive quantity, or an
    /// absolute stock value below zero.
    #[error("Invalid stock quantity: {quantity}")]
    InvalidStock { quantity: i64 },

    /// Not enough stock to satisfy the request.
    ///
    /// ## When This Occurs
    /// - A sale line requests more than `current_stock - reserved_stock`
    /// - A manual removal would leave the counter below zero or below the
    ///   reserved amount
    /// - A purchase cancellation tries to take back goods already sold
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// An increase would push `current_stock` past the configured maximum.
    #[error("Stock for {sku} would exceed maximum {maximum}: attempted {attempted}")]
    StockExceedsMaximum {
        sku: String,
        maximum: i64,
        attempted: i64,
    },

    /// A reservation adjustment would leave `reserved_stock` negative or
    /// above `current_stock`.
    ///
    /// ## When This Occurs
    /// - Releasing more than is currently reserved
    /// - Reserving more than is physically present
    #[error("Invalid reservation for {sku}: reserved {reserved}, current {current}, delta {delta}")]
    InvalidReservation {
        sku: String,
        reserved: i64,
        current: i64,
        delta: i64,
    },

    /// Document date lies after the current calendar day.
    #[error("Document date {date} is in the future")]
    FutureDate { date: NaiveDate },

    /// Mutation attempted on a soft-deleted product.
    #[error("Product {sku} is inactive")]
    InactiveProduct { sku: String },

    /// An order was created with no detail lines.
    #[error("Order must contain at least one line")]
    EmptyOrder,

    /// Order has exceeded the maximum allowed number of lines.
    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// Operation attempted on a cancelled purchase.
    #[error("Purchase {purchase_id} is cancelled")]
    PurchaseCancelled { purchase_id: String },

    /// Operation attempted on a received purchase.
    #[error("Purchase {purchase_id} has already been received")]
    PurchaseReceived { purchase_id: String },

    /// Purchase is not in a state that allows the requested transition.
    #[error("Purchase {purchase_id} is {current_status}, cannot perform operation")]
    InvalidPurchaseStatus {
        purchase_id: String,
        current_status: String,
    },

    /// Operation attempted on a completed sale (other than refund).
    #[error("Sale {sale_id} has already been completed")]
    SaleCompleted { sale_id: String },

    /// Operation attempted on a cancelled sale.
    #[error("Sale {sale_id} is cancelled")]
    SaleCancelled { sale_id: String },

    /// Operation attempted on a refunded sale.
    #[error("Sale {sale_id} has already been refunded")]
    SaleRefunded { sale_id: String },

    /// Edit or delete attempted on a sale that is no longer pending.
    #[error("Sale {sale_id} is not pending")]
    SaleNotPending { sale_id: String },

    /// Sale is not in a state that allows the requested transition.
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, bad series characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "COLA-330".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for COLA-330: available 3, requested 5"
        );

        let err = CoreError::StockExceedsMaximum {
            sku: "COLA-330".to_string(),
            maximum: 100,
            attempted: 120,
        };
        assert_eq!(
            err.to_string(),
            "Stock for COLA-330 would exceed maximum 100: attempted 120"
        );
    }

    #[test]
    fn test_future_date_message() {
        let date = NaiveDate::from_ymd_opt(2031, 1, 15).unwrap();
        let err = CoreError::FutureDate { date };
        assert_eq!(err.to_string(), "Document date 2031-01-15 is in the future");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 500,
        };
        assert_eq!(err.to_string(), "discount must be between 0 and 500");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

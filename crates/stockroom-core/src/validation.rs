//! # Validation Module
//!
//! Input validation utilities shared by the aggregates and the service layer.
//!
//! ## Validation Strategy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                       Validation Layers                                │
//! │                                                                        │
//! │  Layer 1: THIS MODULE + aggregate constructors                         │
//! │  ├── Field format and range checks                                     │
//! │  └── Rejects bad input before any SQL runs                             │
//! │           │                                                            │
//! │           ▼                                                            │
//! │  Layer 2: Guarded UPDATEs (stockroom-db)                               │
//! │  └── Re-check stock invariants atomically at the storage layer         │
//! │           │                                                            │
//! │           ▼                                                            │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / foreign key constraints                       │
//! │  └── CHECK constraints on the stock counters                           │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_SERIES_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert!(validate_sku("COLA-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1 to 200 characters).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a document series like "B001".
///
/// ## Rules
/// - Must not be empty
/// - At most `MAX_SERIES_LEN` characters
/// - Only alphanumeric characters (keeps formatted numbers unambiguous,
///   the series and the correlative are joined with a hyphen)
pub fn validate_series(series: &str) -> ValidationResult<()> {
    let series = series.trim();

    if series.is_empty() {
        return Err(ValidationError::Required {
            field: "series".to_string(),
        });
    }

    if series.len() > MAX_SERIES_LEN {
        return Err(ValidationError::TooLong {
            field: "series".to_string(),
            max: MAX_SERIES_LEN,
        });
    }

    if !series.chars().all(|c| c.is_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "series".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a catalog price in cents. Zero is allowed (unpriced items).
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an order-line unit price. Lines must carry a real price,
/// zero is not a sale.
pub fn validate_unit_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }

    Ok(())
}

/// Validates a per-line discount against the line subtotal.
///
/// ## Rules
/// - 0 <= discount <= quantity * unit_price
pub fn validate_discount_cents(discount: i64, line_subtotal: i64) -> ValidationResult<()> {
    if discount < 0 || discount > line_subtotal {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: line_subtotal,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a minimum/maximum stock threshold pair.
///
/// ## Rules
/// - minimum must be >= 0
/// - maximum, when set, must be > 0 and >= minimum
pub fn validate_stock_bounds(minimum: i64, maximum: Option<i64>) -> ValidationResult<()> {
    if minimum < 0 {
        return Err(ValidationError::OutOfRange {
            field: "minimum_stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if let Some(max) = maximum {
        if max <= 0 || max < minimum {
            return Err(ValidationError::OutOfRange {
                field: "maximum_stock".to_string(),
                min: minimum.max(1),
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COLA-330").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Cola 330ml").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_series() {
        assert!(validate_series("B001").is_ok());
        assert!(validate_series("T1").is_ok());

        assert!(validate_series("").is_err());
        assert!(validate_series("B-001").is_err());
        assert!(validate_series("TOOLONGSERIES").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_prices() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());

        assert!(validate_unit_price_cents(1).is_ok());
        assert!(validate_unit_price_cents(0).is_err());
        assert!(validate_unit_price_cents(-5).is_err());
    }

    #[test]
    fn test_validate_discount() {
        // Line of 3 x 500 = 1500
        assert!(validate_discount_cents(0, 1500).is_ok());
        assert!(validate_discount_cents(1500, 1500).is_ok());
        assert!(validate_discount_cents(-1, 1500).is_err());
        assert!(validate_discount_cents(1501, 1500).is_err());
    }

    #[test]
    fn test_validate_stock_bounds() {
        assert!(validate_stock_bounds(0, None).is_ok());
        assert!(validate_stock_bounds(5, Some(100)).is_ok());
        assert!(validate_stock_bounds(-1, None).is_err());
        assert!(validate_stock_bounds(10, Some(5)).is_err());
        assert!(validate_stock_bounds(0, Some(0)).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(1800).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }
}

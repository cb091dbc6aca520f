//! # Purchase Aggregate
//!
//! A purchase registers goods arriving from a supplier. Stock is added the
//! moment the purchase is created; the status then only records whether the
//! paperwork was confirmed (RECEIVED) or the order was called off (CANCELLED).
//!
//! ## State Machine
//! ```text
//!                  ┌────────────┐
//!     created ────►│ REGISTERED │────► RECEIVED   (final)
//!                  └─────┬──────┘
//!                        │
//!   ┌─────────┐          ▼
//!   │ PENDING │─────► CANCELLED              (final)
//!   └─────────┘
//!
//!   PENDING exists for drafts imported from older systems; new purchases
//!   start at REGISTERED. Cancelling reverses the stock that creation added.
//! ```
//!
//! Legality lives in exactly one place, `PurchaseStatus::can_transition_to`;
//! the mutation methods call it and pick the error from the current state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{DocumentType, NewOrderLine};
use crate::validation::{
    validate_discount_cents, validate_quantity, validate_unit_price_cents,
};
use crate::MAX_ORDER_LINES;

// =============================================================================
// Purchase Status
// =============================================================================

/// Lifecycle state of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Draft imported from an external system, not yet registered.
    Pending,
    /// Registered in the ledger; stock already added.
    Registered,
    /// Goods confirmed against the supplier document. Final.
    Received,
    /// Called off; the stock added at creation was reversed. Final.
    Cancelled,
}

impl PurchaseStatus {
    /// The one transition table. Every status change goes through here.
    pub fn can_transition_to(self, target: PurchaseStatus) -> bool {
        use PurchaseStatus::*;
        matches!(
            (self, target),
            (Pending, Cancelled) | (Registered, Received) | (Registered, Cancelled)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_final(self) -> bool {
        matches!(self, PurchaseStatus::Received | PurchaseStatus::Cancelled)
    }
}

impl Default for PurchaseStatus {
    fn default() -> Self {
        PurchaseStatus::Pending
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Registered => "registered",
            PurchaseStatus::Received => "received",
            PurchaseStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Purchase Detail
// =============================================================================

/// One line of a purchase. Quantity and price are snapshotted at creation;
/// later catalog edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseDetail {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    /// 1-based position within the document.
    pub line_no: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
}

impl PurchaseDetail {
    /// Builds a validated detail line from caller input.
    pub fn from_line(
        purchase_id: impl Into<String>,
        line_no: i64,
        line: &NewOrderLine,
    ) -> CoreResult<PurchaseDetail> {
        validate_quantity(line.quantity)?;
        validate_unit_price_cents(line.unit_price_cents)?;

        let subtotal = line.unit_price_cents * line.quantity;
        validate_discount_cents(line.discount_cents, subtotal)?;

        Ok(PurchaseDetail {
            id: Uuid::new_v4().to_string(),
            purchase_id: purchase_id.into(),
            product_id: line.product_id.clone(),
            line_no,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            discount_cents: line.discount_cents,
        })
    }

    /// quantity * unit_price, before discount.
    #[inline]
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Line amount after discount.
    #[inline]
    pub fn total_with_discount_cents(&self) -> i64 {
        self.subtotal_cents() - self.discount_cents
    }

    /// Discount as a percentage of the line subtotal, for display.
    pub fn discount_percentage(&self) -> f64 {
        let subtotal = self.subtotal_cents();
        if subtotal == 0 {
            return 0.0;
        }
        self.discount_cents as f64 * 100.0 / subtotal as f64
    }

    /// Line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents())
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// Input for registering a purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchase {
    pub supplier_id: String,
    pub user_id: String,
    /// Supplier-assigned document number, unique per store when present.
    pub document_number: Option<String>,
    pub document_type: DocumentType,
    pub purchase_date: NaiveDate,
    /// Tax as stated on the supplier document, in cents.
    #[serde(default)]
    pub tax_cents: i64,
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

/// A purchase document with its owned detail lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
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
    pub updated_at: DateTime<Utc>,

    /// Detail lines, loaded alongside the header. Deleted with it, never
    /// shared with another document.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub details: Vec<PurchaseDetail>,
}

impl Purchase {
    /// Registers a purchase and computes its totals from the lines.
    ///
    /// `today` is the store's current calendar day; the document date may
    /// not lie after it. The caller owns the clock so this stays pure.
    ///
    /// ## Totals
    /// - subtotal = sum of quantity * unit_price over the lines
    /// - discount = sum of line discounts
    /// - tax      = as stated on the supplier document
    /// - total    = subtotal + tax - discount
    pub fn create(
        store_id: impl Into<String>,
        new: NewPurchase,
        today: NaiveDate,
    ) -> CoreResult<Purchase> {
        if new.lines.is_empty() {
            return Err(CoreError::EmptyOrder);
        }
        if new.lines.len() > MAX_ORDER_LINES {
            return Err(CoreError::OrderTooLarge {
                max: MAX_ORDER_LINES,
            });
        }
        if new.purchase_date > today {
            return Err(CoreError::FutureDate {
                date: new.purchase_date,
            });
        }
        if new.tax_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "tax".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let document_number = normalize_document_number(new.document_number)?;

        let id = Uuid::new_v4().to_string();
        let mut details = Vec::with_capacity(new.lines.len());
        for (index, line) in new.lines.iter().enumerate() {
            details.push(PurchaseDetail::from_line(&id, index as i64 + 1, line)?);
        }

        let subtotal_cents: i64 = details.iter().map(|d| d.subtotal_cents()).sum();
        let discount_cents: i64 = details.iter().map(|d| d.discount_cents).sum();
        let total_cents = subtotal_cents + new.tax_cents - discount_cents;

        let now = Utc::now();
        Ok(Purchase {
            id,
            store_id: store_id.into(),
            supplier_id: new.supplier_id,
            user_id: new.user_id,
            document_number,
            document_type: new.document_type,
            purchase_date: new.purchase_date,
            subtotal_cents,
            tax_cents: new.tax_cents,
            discount_cents,
            total_cents,
            status: PurchaseStatus::Registered,
            notes: new.notes,
            registered_at: now,
            updated_at: now,
            details,
        })
    }

    /// Marks the goods as confirmed against the supplier document.
    /// Legal from REGISTERED only.
    pub fn mark_as_received(&mut self) -> CoreResult<()> {
        self.transition(PurchaseStatus::Received)
    }

    /// Calls the purchase off. Legal from PENDING or REGISTERED; the caller
    /// reverses the stock added at creation in the same transaction.
    pub fn cancel(&mut self) -> CoreResult<()> {
        self.transition(PurchaseStatus::Cancelled)
    }

    fn transition(&mut self, target: PurchaseStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(self.transition_error());
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The error a blocked transition surfaces, named after the state that
    /// blocks it.
    fn transition_error(&self) -> CoreError {
        match self.status {
            PurchaseStatus::Cancelled => CoreError::PurchaseCancelled {
                purchase_id: self.id.clone(),
            },
            PurchaseStatus::Received => CoreError::PurchaseReceived {
                purchase_id: self.id.clone(),
            },
            status => CoreError::InvalidPurchaseStatus {
                purchase_id: self.id.clone(),
                current_status: status.to_string(),
            },
        }
    }

    /// Total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Trims a caller-supplied document number; present means non-empty.
pub(crate) fn normalize_document_number(
    number: Option<String>,
) -> Result<Option<String>, ValidationError> {
    match number {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::Required {
                    field: "document_number".to_string(),
                });
            }
            if trimmed.len() > 50 {
                return Err(ValidationError::TooLong {
                    field: "document_number".to_string(),
                    max: 50,
                });
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

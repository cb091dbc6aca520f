//! # Sale Aggregate
//!
//! A sale moves stock out of the store. Creation only promises stock
//! (reservation); the shelf count drops when the sale completes.
//!
//! ## State Machine
//! ```text
//!                 ┌─────────┐  complete   ┌───────────┐  refund   ┌──────────┐
//!    created ────►│ PENDING │────────────►│ COMPLETED │──────────►│ REFUNDED │
//!                 └────┬────┘             └───────────┘           └──────────┘
//!                      │ cancel
//!                      ▼
//!                 ┌───────────┐
//!                 │ CANCELLED │
//!                 └───────────┘
//!
//!    Stock effects per line:
//!      create    reserve(qty)                  hold units for this sale
//!      complete  release(qty) + remove(qty)    hand the units over
//!      cancel    release(qty)                  free the hold, shelf unchanged
//!      refund    add(qty)                      goods come back
//! ```
//!
//! Only PENDING sales may be edited (header fields) or deleted. Legality of
//! every status change lives in `SaleStatus::can_transition_to`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::purchase::normalize_document_number;
use crate::types::{DocumentType, NewOrderLine, TaxRate};
use crate::validation::{
    validate_discount_cents, validate_quantity, validate_series, validate_unit_price_cents,
};
use crate::MAX_ORDER_LINES;

// =============================================================================
// Sale Status
// =============================================================================

/// Lifecycle state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Registered, stock reserved, awaiting completion.
    Pending,
    /// Paid and handed over; stock decremented.
    Completed,
    /// Abandoned before completion; reservation released. Final.
    Cancelled,
    /// Goods returned after completion; stock restored. Final.
    Refunded,
}

impl SaleStatus {
    /// The one transition table. Every status change goes through here.
    pub fn can_transition_to(self, target: SaleStatus) -> bool {
        use SaleStatus::*;
        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Cancelled) | (Completed, Refunded)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_final(self) -> bool {
        matches!(self, SaleStatus::Cancelled | SaleStatus::Refunded)
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Refunded => "refunded",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Sale Detail
// =============================================================================

/// One line of a sale. Snapshots quantity and price at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleDetail {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// 1-based position within the document.
    pub line_no: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
}

impl SaleDetail {
    /// Builds a validated detail line from caller input.
    pub fn from_line(
        sale_id: impl Into<String>,
        line_no: i64,
        line: &NewOrderLine,
    ) -> CoreResult<SaleDetail> {
        validate_quantity(line.quantity)?;
        validate_unit_price_cents(line.unit_price_cents)?;

        let subtotal = line.unit_price_cents * line.quantity;
        validate_discount_cents(line.discount_cents, subtotal)?;

        Ok(SaleDetail {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.into(),
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
}

// =============================================================================
// Sale
// =============================================================================

/// Input for registering a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub customer_id: String,
    pub user_id: String,
    /// Explicit document number (imports). When absent the store's
    /// correlative counter issues one.
    pub document_number: Option<String>,
    pub document_type: DocumentType,
    /// Document series, e.g. "B001". Selects the correlative counter
    /// together with the document type.
    pub series: String,
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

/// Fields of a PENDING sale that may still be edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleHeaderUpdate {
    pub customer_id: Option<String>,
    pub sale_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A sale document with its owned detail lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
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
    pub updated_at: DateTime<Utc>,

    /// Detail lines, loaded alongside the header. Deleted with it, never
    /// shared with another document.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub details: Vec<SaleDetail>,
}

impl Sale {
    /// Registers a sale and computes its totals from the lines.
    ///
    /// The tax rate comes in from configuration; there is no literal rate
    /// anywhere in the order flow. `today` is the store's current calendar
    /// day, owned by the caller so this stays pure.
    ///
    /// ## Totals
    /// - subtotal = sum of quantity * unit_price over the lines
    /// - discount = sum of line discounts
    /// - tax      = (subtotal - discount) at `tax_rate`, rounded half-up
    /// - total    = subtotal + tax - discount
    pub fn create(
        store_id: impl Into<String>,
        new: NewSale,
        tax_rate: TaxRate,
        today: NaiveDate,
    ) -> CoreResult<Sale> {
        if new.lines.is_empty() {
            return Err(CoreError::EmptyOrder);
        }
        if new.lines.len() > MAX_ORDER_LINES {
            return Err(CoreError::OrderTooLarge {
                max: MAX_ORDER_LINES,
            });
        }
        if new.sale_date > today {
            return Err(CoreError::FutureDate {
                date: new.sale_date,
            });
        }
        validate_series(&new.series)?;
        let document_number = normalize_document_number(new.document_number)?;

        let id = Uuid::new_v4().to_string();
        let mut details = Vec::with_capacity(new.lines.len());
        for (index, line) in new.lines.iter().enumerate() {
            details.push(SaleDetail::from_line(&id, index as i64 + 1, line)?);
        }

        let subtotal_cents: i64 = details.iter().map(|d| d.subtotal_cents()).sum();
        let discount_cents: i64 = details.iter().map(|d| d.discount_cents).sum();
        let taxable = Money::from_cents(subtotal_cents - discount_cents);
        let tax_cents = taxable.calculate_tax(tax_rate).cents();
        let total_cents = subtotal_cents + tax_cents - discount_cents;

        let now = Utc::now();
        Ok(Sale {
            id,
            store_id: store_id.into(),
            customer_id: new.customer_id,
            user_id: new.user_id,
            document_number,
            document_type: new.document_type,
            series: new.series.trim().to_string(),
            sale_date: new.sale_date,
            subtotal_cents,
            tax_cents,
            discount_cents,
            total_cents,
            status: SaleStatus::Pending,
            notes: new.notes,
            registered_at: now,
            updated_at: now,
            details,
        })
    }

    /// Completes the sale. Legal from PENDING only; the caller hands the
    /// reserved units over (release + remove) in the same transaction.
    pub fn complete(&mut self) -> CoreResult<()> {
        self.transition(SaleStatus::Completed)
    }

    /// Cancels the sale. Legal from PENDING only; the caller releases the
    /// reservation, the shelf count never changed.
    pub fn cancel(&mut self) -> CoreResult<()> {
        self.transition(SaleStatus::Cancelled)
    }

    /// Refunds a completed sale. The caller puts the goods back on the
    /// shelf in the same transaction.
    pub fn refund(&mut self) -> CoreResult<()> {
        self.transition(SaleStatus::Refunded)
    }

    /// Guard for header edits and deletion, which are PENDING-only.
    pub fn ensure_pending(&self) -> CoreResult<()> {
        if self.status != SaleStatus::Pending {
            return Err(CoreError::SaleNotPending {
                sale_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Edits header fields while the sale is still PENDING.
    pub fn update_header(&mut self, update: SaleHeaderUpdate, today: NaiveDate) -> CoreResult<()> {
        self.ensure_pending()?;

        if let Some(date) = update.sale_date {
            if date > today {
                return Err(CoreError::FutureDate { date });
            }
            self.sale_date = date;
        }
        if let Some(customer_id) = update.customer_id {
            self.customer_id = customer_id;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    fn transition(&mut self, target: SaleStatus) -> CoreResult<()> {
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
            SaleStatus::Completed => CoreError::SaleCompleted {
                sale_id: self.id.clone(),
            },
            SaleStatus::Cancelled => CoreError::SaleCancelled {
                sale_id: self.id.clone(),
            },
            SaleStatus::Refunded => CoreError::SaleRefunded {
                sale_id: self.id.clone(),
            },
            status => CoreError::InvalidSaleStatus {
                sale_id: self.id.clone(),
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

// =============================================================================
// Unit Tests
// =============================================================================

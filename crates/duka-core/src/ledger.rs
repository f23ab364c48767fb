//! # Ledger Rules
//!
//! The arithmetic behind receipt commit and shift reconciliation, with no
//! I/O. `duka-db` runs these inside its transactions; keeping them here means
//! every rule is testable without a database.
//!
//! ## Sign Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sale vs Return                                     │
//! │                                                                         │
//! │                       quantity   stock delta   money delta              │
//! │  Sale   (is_return=0)    2           -2          +total                 │
//! │  Return (is_return=1)    2           +2          -total                 │
//! │                                                                         │
//! │  Quantities and amounts are ALWAYS stored positive. The flag alone      │
//! │  decides direction, so there is exactly one source of truth.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, Shift, ShiftState, TenderMethod};

// =============================================================================
// Receipt Numbering
// =============================================================================

/// Formats an allocated sequence value as a receipt number.
///
/// ```rust
/// use duka_core::ledger::format_receipt_number;
///
/// assert_eq!(format_receipt_number("POS-01", 42), "POS-01-00042");
/// assert_eq!(format_receipt_number("POS-01", 123456), "POS-01-123456");
/// ```
pub fn format_receipt_number(prefix: &str, n: i64) -> String {
    format!("{}-{:05}", prefix, n)
}

// =============================================================================
// Stock
// =============================================================================

/// Stock change for a line: sales remove units, returns put them back.
#[inline]
pub const fn stock_delta(quantity: i64, is_return: bool) -> i64 {
    if is_return {
        quantity
    } else {
        -quantity
    }
}

// =============================================================================
// Customer Credit
// =============================================================================

/// Signed balance change for the credit portion of a receipt.
#[inline]
pub const fn credit_delta(credit_portion_cents: i64, is_return: bool) -> i64 {
    if is_return {
        -credit_portion_cents
    } else {
        credit_portion_cents
    }
}

/// Checks a balance change against the customer's debt limit.
///
/// Returns the balance after the change. Only increases are checked: a
/// return or repayment may always bring a balance down, even one that sits
/// above a since-lowered limit.
///
/// ```text
/// balance 900.00 + delta 200.00 = 1100.00 > limit 1000.00  ──► rejected
/// balance 900.00 + delta 100.00 = 1000.00 = limit          ──► allowed
/// ```
///
/// A change whose sum does not fit in `i64` is over any limit.
pub fn check_debt_limit(customer: &Customer, delta_cents: i64) -> CoreResult<i64> {
    let exceeded = || CoreError::DebtLimitExceeded {
        customer_id: customer.id.clone(),
        balance_cents: customer.current_balance_cents,
        attempted_cents: delta_cents,
        limit_cents: customer.debt_limit_cents,
    };

    let new_balance = customer
        .current_balance_cents
        .checked_add(delta_cents)
        .ok_or_else(|| exceeded())?;

    if delta_cents > 0 && new_balance > customer.debt_limit_cents {
        return Err(exceeded());
    }

    Ok(new_balance)
}

/// Applies a repayment, never leaving the shop owing the customer.
///
/// ```rust
/// use duka_core::ledger::apply_repayment;
///
/// assert_eq!(apply_repayment(50_000, 20_000), 30_000);
/// assert_eq!(apply_repayment(10_000, 20_000), 0);
/// ```
pub fn apply_repayment(balance_cents: i64, amount_cents: i64) -> i64 {
    balance_cents.saturating_sub(amount_cents).max(0)
}

// =============================================================================
// Shift Totals
// =============================================================================

/// One tender leg of one receipt, as read back for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TenderLine {
    pub receipt_id: String,
    pub method: TenderMethod,
    pub amount_cents: i64,
    pub is_return: bool,
}

/// Per-method sales for a shift, signed for returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftTotals {
    pub cash_cents: i64,
    pub mobile_cents: i64,
    pub credit_cents: i64,
    /// Number of distinct receipts (sales and returns).
    pub receipt_count: i64,
}

impl ShiftTotals {
    /// Folds tender lines into buckets.
    ///
    /// Buckets saturate instead of wrapping; amounts are capped at
    /// [`MAX_RECEIPT_TOTAL`](crate::MAX_RECEIPT_TOTAL) on the way in.
    ///
    /// Lines must be grouped by receipt (ordered by receipt id) for the
    /// count to be right. A SPLIT receipt spreads over several buckets but
    /// counts once.
    pub fn accumulate<'a, I>(lines: I) -> ShiftTotals
    where
        I: IntoIterator<Item = &'a TenderLine>,
    {
        let mut totals = ShiftTotals::default();
        let mut last_receipt: Option<&str> = None;

        for line in lines {
            if last_receipt != Some(line.receipt_id.as_str()) {
                totals.receipt_count += 1;
                last_receipt = Some(line.receipt_id.as_str());
            }

            let amount = Money::from_cents(line.amount_cents)
                .signed(line.is_return)
                .cents();

            let bucket = match line.method {
                TenderMethod::Cash => &mut totals.cash_cents,
                TenderMethod::Mobile => &mut totals.mobile_cents,
                TenderMethod::Credit => &mut totals.credit_cents,
            };
            *bucket = bucket.saturating_add(amount);
        }

        totals
    }

    /// Cash the till should hold: opening float plus net cash sales.
    #[inline]
    pub fn expected_cash(&self, opening_float_cents: i64) -> i64 {
        opening_float_cents.saturating_add(self.cash_cents)
    }
}

// =============================================================================
// Z-Report
// =============================================================================

/// Expected-vs-actual cash reconciliation for a shift.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ZReport {
    pub shift_id: String,
    pub staff_id: String,
    pub status: ShiftState,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub opening_float_cents: i64,
    pub total_cash_sales_cents: i64,
    pub total_mobile_sales_cents: i64,
    pub total_credit_sales_cents: i64,
    pub transaction_count: i64,
    pub closing_expected_cents: i64,
    pub closing_actual_cents: i64,
    /// `actual - expected`: negative means the till is short.
    pub variance_cents: i64,
}

impl ZReport {
    /// Builds the report for `shift` from its totals and counted cash.
    pub fn new(shift: &Shift, totals: &ShiftTotals, closing_actual_cents: i64) -> ZReport {
        let expected = totals.expected_cash(shift.opening_float_cents);

        ZReport {
            shift_id: shift.id.clone(),
            staff_id: shift.staff_id.clone(),
            status: shift.state(),
            opened_at: shift.opened_at,
            closed_at: shift.closed_at,
            opening_float_cents: shift.opening_float_cents,
            total_cash_sales_cents: totals.cash_cents,
            total_mobile_sales_cents: totals.mobile_cents,
            total_credit_sales_cents: totals.credit_cents,
            transaction_count: totals.receipt_count,
            closing_expected_cents: expected,
            closing_actual_cents,
            variance_cents: closing_actual_cents.saturating_sub(expected),
        }
    }

    #[inline]
    pub fn variance(&self) -> Money {
        Money::from_cents(self.variance_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

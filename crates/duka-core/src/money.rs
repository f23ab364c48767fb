//! # Money Module
//!
//! Provides the `Money` type for every shilling that moves through the till.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Opening float 500.00 + cash sale 400.10 - refund 0.10                  │
//! │    as f64:  899.9999999999999  ❌ variance of -0.0000000000001          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    50000 + 40010 - 10 = 90000 cents                                     │
//! │    A Z-report either balances to the cent or it doesn't.                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use duka_core::money::Money;
//!
//! let float = Money::from_cents(50_000);  // KSh 500.00
//! let sale = Money::from_major_minor(400, 0);
//! assert_eq!((float + sale).cents(), 90_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (1/100 KSh).
///
/// ## Design Decisions
/// - **i64 (signed)**: returns and credit repayments are negative movements
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price_selling ──► SaleItem.unit_price (snapshot) ──► line total│
/// │                                                                         │
/// │  Receipt.total ──┬──► Tender amounts (cash / mobile / credit)           │
/// │                  ├──► Customer.current_balance (credit portion)         │
/// │                  └──► ShiftTotals ──► ZReport.expected / variance       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use duka_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // KSh 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from shillings and cents.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-shilling portion (truncated toward zero).
    #[inline]
    pub const fn shillings(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a line quantity.
    ///
    /// ## Example
    /// ```rust
    /// use duka_core::money::Money;
    ///
    /// let unit = Money::from_cents(6_500); // Unga 2kg
    /// assert_eq!(unit.multiply_quantity(3).cents(), 19_500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the amount signed for the ledger: negated for returns.
    ///
    /// ```text
    /// sale   400.00 ──► +400.00  (cash into till, debt up)
    /// return 400.00 ──► -400.00  (cash out of till, debt down)
    /// ```
    #[inline]
    pub const fn signed(&self, is_return: bool) -> Self {
        if is_return {
            Money(-self.0)
        } else {
            Money(self.0)
        }
    }

    /// Calculates tax on a tax-exclusive amount, rounding half up.
    ///
    /// Formula: `(amount * bps + 5000) / 10000`, computed in i128.
    ///
    /// ```rust
    /// use duka_core::money::Money;
    /// use duka_core::types::TaxRate;
    ///
    /// let net = Money::from_cents(10_000);
    /// assert_eq!(net.calculate_tax(TaxRate::from_bps(1600)).cents(), 1_600);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Extracts the tax contained in a tax-inclusive amount, rounding half up.
    ///
    /// Shelf prices in a duka include VAT, so the tax portion of a gross
    /// amount at 16% is `gross * 1600 / 11600`.
    ///
    /// ## Example
    /// ```rust
    /// use duka_core::money::Money;
    /// use duka_core::types::TaxRate;
    ///
    /// let gross = Money::from_cents(11_600); // KSh 116.00
    /// let vat = gross.inclusive_tax(TaxRate::from_bps(1600));
    /// assert_eq!(vat.cents(), 1_600);
    /// ```
    pub fn inclusive_tax(&self, rate: TaxRate) -> Money {
        if rate.is_zero() {
            return Money::zero();
        }
        let bps = rate.bps() as i128;
        let divisor = 10_000 + bps;
        let numerator = self.0 as i128 * bps;
        // Round half away from zero so returns mirror sales exactly.
        let half = divisor / 2;
        let tax = if numerator >= 0 {
            (numerator + half) / divisor
        } else {
            (numerator - half) / divisor
        };
        Money::from_cents(tax as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `KSh 10.99`. Debugging and log output only.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}KSh {}.{:02}",
            sign,
            self.shillings().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.shillings(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(400, 0).cents(), 40_000);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(90_000).to_string(), "KSh 900.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-KSh 5.50");
        assert_eq!(Money::zero().to_string(), "KSh 0.00");
    }

    #[test]
    fn test_signed_for_returns() {
        let amount = Money::from_cents(40_000);
        assert_eq!(amount.signed(false).cents(), 40_000);
        assert_eq!(amount.signed(true).cents(), -40_000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, -50]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 300);
    }

    #[test]
    fn test_exclusive_tax() {
        // 8.25 at 16% = 1.32
        let tax = Money::from_cents(825).calculate_tax(TaxRate::from_bps(1600));
        assert_eq!(tax.cents(), 132);
    }

    #[test]
    fn test_inclusive_tax() {
        let rate = TaxRate::from_bps(1600);
        assert_eq!(Money::from_cents(11_600).inclusive_tax(rate).cents(), 1_600);
        // 400.00 gross: 400 / 1.16 * 0.16 = 55.172... -> 55.17
        assert_eq!(Money::from_cents(40_000).inclusive_tax(rate).cents(), 5_517);
        assert_eq!(Money::from_cents(-40_000).inclusive_tax(rate).cents(), -5_517);
        assert!(Money::from_cents(40_000)
            .inclusive_tax(TaxRate::zero())
            .is_zero());
    }
}

//! # Domain Types
//!
//! Core domain types used throughout DukaPOS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Staff       │   │     Shift       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  staff_id       │   │  id (UUID)      │       │
//! │  │  username       │   │  opening_float  │   │  balance        │       │
//! │  │  is_active      │   │  closed_at?     │   │  debt_limit     │       │
//! │  └─────────────────┘   └────────▲────────┘   └────────▲────────┘       │
//! │                                 │ shift_id?           │ customer_id?   │
//! │  ┌─────────────────┐   ┌────────┴─────────────────────┴──────┐         │
//! │  │    Product      │   │              Receipt                │         │
//! │  │  ─────────────  │   │  ─────────────────────────────────  │         │
//! │  │  barcode        │   │  receipt_number  POS-01-00042       │         │
//! │  │  price_selling  │   │  payment: PaymentClassification     │         │
//! │  │  stock_quantity │   │  payment_status, is_return          │         │
//! │  └────────▲────────┘   └────────▲────────────────────────────┘         │
//! │           │ product_id          │ receipt_id                           │
//! │           └──────────── SaleItem (price snapshot, qty > 0) ────        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (barcode, receipt_number, username) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1600 bps = 16% (Kenyan standard VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a whole-percent string, e.g. `"16"`.
    ///
    /// Used by the tax submission payload, which expects the rate as text.
    pub fn percent_label(&self) -> String {
        if self.0 % 100 == 0 {
            format!("{}", self.0 / 100)
        } else {
            format!("{}.{:02}", self.0 / 100, self.0 % 100)
        }
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_VAT_BPS)
    }
}

// =============================================================================
// Staff
// =============================================================================

/// Role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Cashier,
}

/// A person who can ring up sales and own a shift.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: StaffRole,
    /// Deactivated staff keep their history but cannot transact.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
///
/// `stock_quantity` has no floor: selling more than is on hand drives it
/// negative, which reporting picks up as an oversell.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Scanned barcode, unique across the catalog.
    pub barcode: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Cost price in cents.
    pub price_buying_cents: i64,

    /// Retail shelf price in cents (VAT inclusive).
    pub price_selling_cents: i64,

    /// Bulk price in cents, applied at or above `wholesale_threshold`.
    pub wholesale_price_cents: Option<i64>,

    /// Minimum line quantity for the wholesale price.
    pub wholesale_threshold: Option<i64>,

    /// VAT rate in basis points (1600 = 16%).
    pub tax_rate_bps: u32,

    /// Units on hand. May be negative after an oversell.
    pub stock_quantity: i64,

    /// Reorder level for the low-stock report.
    pub min_stock_alert: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the retail price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_selling_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Unit price for a line of `quantity` units.
    ///
    /// ```text
    /// Sugar 1kg: retail 150.00, wholesale 140.00 from 10 units
    ///   qty 3  ──► 150.00
    ///   qty 12 ──► 140.00
    /// ```
    pub fn price_for_quantity(&self, quantity: i64) -> Money {
        match (self.wholesale_price_cents, self.wholesale_threshold) {
            (Some(price), Some(threshold)) if threshold > 0 && quantity >= threshold => {
                Money::from_cents(price)
            }
            _ => self.price(),
        }
    }

    /// Stock has gone below zero.
    #[inline]
    pub fn is_oversold(&self) -> bool {
        self.stock_quantity < 0
    }

    /// Stock is at or below the reorder level.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_alert
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who may buy on credit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Buyer PIN forwarded on tax invoices.
    pub kra_pin: Option<String>,
    /// Signed: positive means the customer owes the shop.
    pub current_balance_cents: i64,
    /// Ceiling for `current_balance_cents` after any credit sale.
    pub debt_limit_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.current_balance_cents)
    }

    #[inline]
    pub fn debt_limit(&self) -> Money {
        Money::from_cents(self.debt_limit_cents)
    }

    /// Headroom left before the debt limit. Negative if already over.
    pub fn available_credit(&self) -> Money {
        self.debt_limit() - self.balance()
    }
}

// =============================================================================
// Shift
// =============================================================================

/// Lifecycle state of a shift. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ShiftState {
    Open,
    Closed,
}

/// A cashier's accountability period, from till-open to till-close.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub staff_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    /// Cash placed in the till at open.
    pub opening_float_cents: i64,
    /// `None` while the shift is open.
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Counted cash, recorded at close.
    pub closing_actual_cents: Option<i64>,
    /// Computed cash, recorded at close.
    pub closing_expected_cents: Option<i64>,
}

impl Shift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    pub fn state(&self) -> ShiftState {
        if self.is_open() {
            ShiftState::Open
        } else {
            ShiftState::Closed
        }
    }

    #[inline]
    pub fn opening_float(&self) -> Money {
        Money::from_cents(self.opening_float_cents)
    }
}

// =============================================================================
// Payment Classification
// =============================================================================

/// Top-level payment shape, as stored on the receipt row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentKind {
    Cash,
    Mobile,
    Credit,
    Split,
}

/// A single-method payment leg. Every receipt has at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum TenderMethod {
    Cash,
    Mobile,
    Credit,
}

impl fmt::Display for TenderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenderMethod::Cash => write!(f, "CASH"),
            TenderMethod::Mobile => write!(f, "MOBILE"),
            TenderMethod::Credit => write!(f, "CREDIT"),
        }
    }
}

/// One leg of a payment: method, amount and optional mobile subtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tender {
    pub method: TenderMethod,
    /// Always positive; returns are signed by the receipt's `is_return`.
    pub amount_cents: i64,
    /// e.g. `"MPESA"` for mobile money.
    #[serde(default)]
    pub subtype: Option<String>,
}

impl Tender {
    pub fn new(method: TenderMethod, amount_cents: i64) -> Self {
        Tender {
            method,
            amount_cents,
            subtype: None,
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// How a receipt was paid.
///
/// ## Wire Format
/// ```json
/// { "kind": "CASH" }
/// { "kind": "MOBILE", "subtype": "MPESA" }
/// { "kind": "CREDIT" }
/// { "kind": "SPLIT", "tenders": [
///     { "method": "CASH",   "amount_cents": 30000 },
///     { "method": "CREDIT", "amount_cents": 10000 } ] }
/// ```
///
/// Credit checks match on this enum; they never parse a side payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum PaymentClassification {
    Cash,
    Mobile {
        #[serde(default)]
        subtype: Option<String>,
    },
    Credit,
    Split {
        tenders: Vec<Tender>,
    },
}

impl PaymentClassification {
    pub fn kind(&self) -> PaymentKind {
        match self {
            PaymentClassification::Cash => PaymentKind::Cash,
            PaymentClassification::Mobile { .. } => PaymentKind::Mobile,
            PaymentClassification::Credit => PaymentKind::Credit,
            PaymentClassification::Split { .. } => PaymentKind::Split,
        }
    }

    /// Mobile subtype of a single-method mobile payment.
    pub fn subtype(&self) -> Option<&str> {
        match self {
            PaymentClassification::Mobile { subtype } => subtype.as_deref(),
            _ => None,
        }
    }

    /// Normalises the classification into tender legs for `total_cents`.
    ///
    /// Single-method payments become one leg carrying the full total.
    pub fn tenders(&self, total_cents: i64) -> Vec<Tender> {
        match self {
            PaymentClassification::Cash => vec![Tender::new(TenderMethod::Cash, total_cents)],
            PaymentClassification::Mobile { subtype } => vec![Tender {
                method: TenderMethod::Mobile,
                amount_cents: total_cents,
                subtype: subtype.clone(),
            }],
            PaymentClassification::Credit => vec![Tender::new(TenderMethod::Credit, total_cents)],
            PaymentClassification::Split { tenders } => tenders.clone(),
        }
    }

    /// Unsigned amount billed to the customer's account.
    pub fn credit_portion(&self, total_cents: i64) -> i64 {
        match self {
            PaymentClassification::Credit => total_cents,
            PaymentClassification::Split { tenders } => tenders
                .iter()
                .filter(|t| t.method == TenderMethod::Credit)
                .fold(0i64, |acc, t| acc.saturating_add(t.amount_cents)),
            PaymentClassification::Cash | PaymentClassification::Mobile { .. } => 0,
        }
    }

    /// Whether any part of the payment goes on the customer's account.
    pub fn involves_credit(&self) -> bool {
        match self {
            PaymentClassification::Credit => true,
            PaymentClassification::Split { tenders } => {
                tenders.iter().any(|t| t.method == TenderMethod::Credit)
            }
            PaymentClassification::Cash | PaymentClassification::Mobile { .. } => false,
        }
    }

    /// Rebuilds a classification from its stored receipt columns and legs.
    pub fn from_stored(
        kind: PaymentKind,
        subtype: Option<String>,
        tenders: Vec<Tender>,
    ) -> PaymentClassification {
        match kind {
            PaymentKind::Cash => PaymentClassification::Cash,
            PaymentKind::Mobile => PaymentClassification::Mobile { subtype },
            PaymentKind::Credit => PaymentClassification::Credit,
            PaymentKind::Split => PaymentClassification::Split { tenders },
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement status of a receipt's payment.
///
/// ```text
///            ┌──► COMPLETED
///  PENDING ──┤
///            └──► FAILED
/// ```
/// COMPLETED and FAILED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Only a pending payment may settle, and only to a terminal state.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Completed)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Completed
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Completed => write!(f, "COMPLETED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// The record of one completed sale or return.
///
/// Immutable once written, except for `payment_status` and
/// `reference_code`, which the payment callback may settle.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub id: String,
    /// Station-prefixed number, e.g. `POS-01-00042`.
    pub receipt_number: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Orphan sales (no open shift) are allowed.
    pub shift_id: Option<String>,
    pub staff_id: String,
    pub customer_id: Option<String>,
    /// Always positive; `is_return` carries the direction.
    pub total_cents: i64,
    pub payment: PaymentClassification,
    pub payment_status: PaymentStatus,
    /// Mobile money confirmation code.
    pub reference_code: Option<String>,
    /// Gateway id used to match the asynchronous payment callback.
    pub checkout_request_id: Option<String>,
    pub is_return: bool,
    pub origin_station: String,
}

impl Receipt {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total signed for the ledger (negative for returns).
    #[inline]
    pub fn signed_total(&self) -> Money {
        self.total().signed(self.is_return)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line on a receipt.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub receipt_id: String,
    pub product_id: String,
    /// Staff member accountable for the line.
    pub staff_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Always positive.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub is_return: bool,
    pub return_reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// Change applied to the product's stock by this line.
    #[inline]
    pub fn stock_delta(&self) -> i64 {
        crate::ledger::stock_delta(self.quantity, self.is_return)
    }
}

// =============================================================================
// Commit Request / Result
// =============================================================================

/// One cart line submitted for commit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    /// Strictly positive.
    pub quantity: i64,
    /// Price agreed at the till; `None` uses the catalog price for the
    /// quantity (wholesale when it applies).
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    #[serde(default)]
    pub return_reason: Option<String>,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
            unit_price_cents: None,
            return_reason: None,
        }
    }

    pub fn at_price(mut self, unit_price_cents: i64) -> Self {
        self.unit_price_cents = Some(unit_price_cents);
        self
    }

    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.return_reason = Some(reason.into());
        self
    }
}

/// Everything needed to commit one receipt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommitReceiptRequest {
    pub staff_id: String,
    #[serde(default)]
    pub shift_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub payment: PaymentClassification,
    pub items: Vec<CartLine>,
    /// Positive receipt total in cents.
    pub total_cents: i64,
    #[serde(default)]
    pub is_return: bool,
    #[serde(default)]
    pub reference_code: Option<String>,
    /// Set when a mobile payment was initiated but not yet confirmed; the
    /// receipt is then stored as PENDING.
    #[serde(default)]
    pub checkout_request_id: Option<String>,
    /// Overrides the ledger's station for receipts keyed in elsewhere.
    #[serde(default)]
    pub origin_station: Option<String>,
}

impl CommitReceiptRequest {
    /// Initial payment status implied by the request.
    pub fn initial_status(&self) -> PaymentStatus {
        if self.checkout_request_id.is_some() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Completed
        }
    }
}

/// A product whose stock went negative in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OversoldProduct {
    pub product_id: String,
    pub stock_quantity: i64,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommittedReceipt {
    pub receipt: Receipt,
    pub items: Vec<SaleItem>,
    /// Products driven below zero by this commit.
    pub oversold: Vec<OversoldProduct>,
}

/// Row of the stock alert report.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockAlert {
    pub product_id: String,
    pub barcode: String,
    pub name: String,
    pub stock_quantity: i64,
    pub min_stock_alert: i64,
}

impl StockAlert {
    #[inline]
    pub fn is_oversold(&self) -> bool {
        self.stock_quantity < 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

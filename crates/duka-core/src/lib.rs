//! # duka-core: Pure Business Logic for DukaPOS
//!
//! The rules behind every receipt and every till count, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DukaPOS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Transport layer (HTTP routers, webhooks)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 duka-db::Ledger (transactions)                  │   │
//! │  │   commit_receipt • open_shift • close_shift • next_receipt_id   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls into                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ duka-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │ validation│  │   │
//! │  │   │  Receipt  │  │   Money   │  │ DebtLimit │  │   cart    │  │   │
//! │  │   │  Payment  │  │  VAT math │  │  ZReport  │  │   split   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Receipt, Shift, PaymentClassification, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Credit limit, stock delta and shift reconciliation rules
//! - [`error`] - Domain error types
//! - [`validation`] - Stateless input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use duka_core::ledger::{ShiftTotals, TenderLine};
//! use duka_core::TenderMethod;
//!
//! let lines = vec![TenderLine {
//!     receipt_id: "r-1".into(),
//!     method: TenderMethod::Cash,
//!     amount_cents: 40_000,
//!     is_return: false,
//! }];
//! let totals = ShiftTotals::accumulate(&lines);
//! assert_eq!(totals.expected_cash(50_000), 90_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{ShiftTotals, ZReport};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Station prefix used when none is configured.
pub const DEFAULT_STATION: &str = "POS-01";

/// Standard VAT rate in basis points (16%).
pub const DEFAULT_VAT_BPS: u32 = 1600;

/// Default reorder level for new products.
pub const DEFAULT_MIN_STOCK_ALERT: i64 = 5;

/// Maximum lines allowed on a single receipt.
///
/// ## Business Reason
/// Prevents runaway carts and keeps the commit transaction short.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// ## Business Reason
/// Catches fat-finger entries (1000 instead of 10) before they hit stock.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest amount accepted anywhere a caller supplies money: receipt
/// totals, tender legs, unit prices, floats and repayments (KSh 1 billion).
///
/// ## Business Reason
/// Keeps every ledger sum well inside `i64`, so totals, balances and shift
/// buckets cannot overflow.
pub const MAX_RECEIPT_TOTAL: i64 = 100_000_000_000;

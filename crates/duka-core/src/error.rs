//! # Error Types
//!
//! Domain-specific error types for duka-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  duka-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Malformed input, caught before any write       │
//! │                                                                         │
//! │  duka-db errors (separate crate)                                       │
//! │  ├── DbError          - Store failures (conflict, connection, ...)     │
//! │  └── LedgerError      - CoreError | DbError, what callers see          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → transport layer     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these errors are ever retried by the core. A caller that sees
//! `DebtLimitExceeded` must change the sale; only store conflicts are
//! retryable, and then only from the top.

use thiserror::Error;

use crate::types::PaymentStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Staff member does not exist or has been deactivated.
    ///
    /// ## When This Occurs
    /// - Receipt commit with an unknown `staff_id`
    /// - Opening a shift for a deactivated cashier
    #[error("Invalid staff: {0}")]
    InvalidStaff(String),

    /// Customer referenced by a sale does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// A CREDIT payment needs a customer to bill.
    #[error("Credit payment requires a customer")]
    CustomerRequired,

    /// Committing would push the customer's balance above their debt limit.
    ///
    /// ## User Workflow
    /// ```text
    /// Customer: balance 900.00, limit 1000.00
    ///      │
    ///      ▼
    /// CREDIT sale of 200.00 → new balance 1100.00
    ///      │
    ///      ▼
    /// DebtLimitExceeded { balance: 90000, attempted: 20000, limit: 100000 }
    ///      │
    ///      ▼
    /// Cashier reduces the amount or takes part of it in cash
    /// ```
    #[error(
        "Debt limit exceeded for customer {customer_id}: balance {balance_cents}, \
         attempted {attempted_cents}, limit {limit_cents}"
    )]
    DebtLimitExceeded {
        customer_id: String,
        balance_cents: i64,
        attempted_cents: i64,
        limit_cents: i64,
    },

    /// Product referenced by a cart line does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Shift does not exist.
    #[error("Shift not found: {0}")]
    ShiftNotFound(String),

    /// Shift has already been closed; closing is terminal.
    #[error("Shift {0} is already closed")]
    ShiftAlreadyClosed(String),

    /// Receipt referenced by a payment callback does not exist.
    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    /// Payment status can only move out of PENDING.
    #[error("Cannot move payment from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Payment breakdown does not describe the receipt total.
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds a `CoreError::InvalidPayment` from any message.
    pub fn invalid_payment(reason: impl Into<String>) -> Self {
        CoreError::InvalidPayment {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by [`crate::validation`] before a transaction is opened.
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

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, bad station prefix).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two amounts that must agree don't.
    #[error("{field} is {actual}, expected {expected}")]
    Mismatch {
        field: String,
        expected: i64,
        actual: i64,
    },
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
    fn test_debt_limit_message() {
        let err = CoreError::DebtLimitExceeded {
            customer_id: "c-1".to_string(),
            balance_cents: 90_000,
            attempted_cents: 20_000,
            limit_cents: 100_000,
        };
        assert_eq!(
            err.to_string(),
            "Debt limit exceeded for customer c-1: balance 90000, attempted 20000, limit 100000"
        );
    }

    #[test]
    fn test_payment_transition_message() {
        let err = CoreError::InvalidPaymentTransition {
            from: PaymentStatus::Completed,
            to: PaymentStatus::Pending,
        };
        assert_eq!(err.to_string(), "Cannot move payment from COMPLETED to PENDING");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

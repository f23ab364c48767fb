//! # Ledger
//!
//! The transactional money-movement core: receipt commit, receipt
//! numbering, the shift lifecycle and customer repayments.
//!
//! ## One Operation, One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ledger Operation Shape                               │
//! │                                                                         │
//! │  validate (duka-core, no I/O)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  first statement is a WRITE  ──► this transaction owns the write lock  │
//! │       │                          (other writers wait on busy_timeout)  │
//! │       ▼                                                                 │
//! │  precondition reads  ──► always fresh, nobody else can write           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  writes                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──► any error before here drops the transaction = ROLLBACK     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Taking the write lock first is what serialises per-customer credit
//! checks and per-station numbering: a read-then-write transaction in WAL
//! mode could otherwise check a balance that another till is about to
//! change.
//!
//! The ledger never retries. A [`LedgerError`](crate::LedgerError) with
//! `is_retryable()` may be resubmitted by the caller from the top.

mod commit;
mod hooks;
mod shift;

pub use hooks::{ReceiptSink, SinkError};

use std::sync::Arc;

use sqlx::SqliteConnection;
use tracing::{debug, info};

use duka_core::ledger::{apply_repayment, format_receipt_number};
use duka_core::validation::{
    validate_amount, validate_id, validate_positive, validate_station_prefix,
};
use duka_core::{CoreError, Customer, PaymentStatus, Receipt, StockAlert};

use crate::error::LedgerResult;
use crate::pool::Database;
use crate::repository::{customer, receipt, sequence};

/// Entry point for every ledger operation of one station.
///
/// Cheap to clone; clones share the pool and the registered sinks.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = Ledger::new(db, "POS-01")?
///     .with_sink(Arc::new(TaxSubmitter::new(tax_config, db.clone())?));
///
/// let shift = ledger.open_shift(&staff_id, 50_000).await?;
/// let committed = ledger.commit_receipt(request).await?;
/// let report = ledger.close_shift(&shift.id, 90_000).await?;
/// ```
#[derive(Clone)]
pub struct Ledger {
    db: Database,
    station: String,
    sinks: Vec<Arc<dyn ReceiptSink>>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sinks: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("Ledger")
            .field("station", &self.station)
            .field("sinks", &sinks)
            .finish()
    }
}

impl Ledger {
    /// Creates a ledger for `station`, which prefixes its receipt numbers.
    pub fn new(db: Database, station: impl Into<String>) -> LedgerResult<Self> {
        let station = station.into();
        validate_station_prefix(&station)?;

        Ok(Ledger {
            db,
            station,
            sinks: Vec::new(),
        })
    }

    /// Registers a post-commit sink.
    pub fn with_sink(mut self, sink: Arc<dyn ReceiptSink>) -> Self {
        info!(sink = sink.name(), "Registered receipt sink");
        self.sinks.push(sink);
        self
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Sequence Generator
    // =========================================================================

    /// Allocates the next receipt number for `prefix` in its own transaction.
    ///
    /// [`Ledger::commit_receipt`] allocates inside the receipt transaction
    /// instead; this is for callers that need a number without a sale.
    ///
    /// ```text
    /// next_receipt_id("POS-01") → "POS-01-00001"
    /// next_receipt_id("POS-01") → "POS-01-00002"
    /// ```
    pub async fn next_receipt_id(&self, prefix: &str) -> LedgerResult<String> {
        validate_station_prefix(prefix)?;

        let mut tx = self.db.pool().begin().await?;
        let number = allocate_receipt_number(&mut tx, prefix).await?;
        tx.commit().await?;

        Ok(number)
    }

    // =========================================================================
    // Credit Ledger
    // =========================================================================

    /// Records a customer paying down their balance.
    ///
    /// The balance never drops below zero: overpayment is not held as credit.
    pub async fn record_repayment(
        &self,
        customer_id: &str,
        amount_cents: i64,
    ) -> LedgerResult<Customer> {
        validate_id("customer_id", customer_id)?;
        validate_positive("repayment", amount_cents)?;
        validate_amount("repayment", amount_cents)?;

        let mut tx = self.db.pool().begin().await?;

        if !customer::touch(&mut tx, customer_id).await? {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }

        let mut current = customer::fetch_customer(&mut tx, customer_id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;

        let new_balance = apply_repayment(current.current_balance_cents, amount_cents);
        customer::set_balance(&mut tx, customer_id, new_balance).await?;
        tx.commit().await?;

        info!(
            customer_id = %customer_id,
            amount_cents,
            balance_before = current.current_balance_cents,
            balance_after = new_balance,
            "Recorded repayment"
        );

        current.current_balance_cents = new_balance;
        Ok(current)
    }

    // =========================================================================
    // Payment Settlement
    // =========================================================================

    /// Settles a PENDING mobile payment from the gateway callback.
    ///
    /// ## Transitions
    /// - PENDING → COMPLETED (with the gateway's reference code)
    /// - PENDING → FAILED
    /// - anything else → `InvalidPaymentTransition`
    ///
    /// A settled receipt is never re-opened. Ledger effects (stock, credit)
    /// were applied at commit and are not touched here.
    pub async fn update_payment_status(
        &self,
        checkout_request_id: &str,
        status: PaymentStatus,
        reference_code: Option<&str>,
    ) -> LedgerResult<Receipt> {
        validate_id("checkout_request_id", checkout_request_id)?;

        if !PaymentStatus::Pending.can_transition_to(status) {
            return Err(CoreError::InvalidPaymentTransition {
                from: PaymentStatus::Pending,
                to: status,
            }
            .into());
        }

        let mut tx = self.db.pool().begin().await?;
        let moved =
            receipt::settle_payment(&mut tx, checkout_request_id, status, reference_code).await?;

        let current = receipt::fetch_by_checkout_request(&mut tx, checkout_request_id)
            .await?
            .ok_or_else(|| CoreError::ReceiptNotFound(checkout_request_id.to_string()))?;

        if !moved {
            return Err(CoreError::InvalidPaymentTransition {
                from: current.payment_status,
                to: status,
            }
            .into());
        }

        tx.commit().await?;

        info!(
            receipt_number = %current.receipt_number,
            %status,
            "Payment settled"
        );
        Ok(current)
    }

    // =========================================================================
    // Read Queries
    // =========================================================================

    /// Products that are oversold or at/below their alert threshold.
    pub async fn stock_alerts(&self) -> LedgerResult<Vec<StockAlert>> {
        Ok(self.db.products().stock_alerts().await?)
    }

    /// Receipts tied to a shift, oldest first.
    pub async fn receipts_for_shift(&self, shift_id: &str) -> LedgerResult<Vec<Receipt>> {
        validate_id("shift_id", shift_id)?;

        let receipts = self.db.receipts().list_for_shift(shift_id).await?;
        debug!(shift_id = %shift_id, count = receipts.len(), "Listed shift receipts");
        Ok(receipts)
    }
}

/// Allocates and formats the next receipt number inside the caller's
/// transaction.
///
/// The increment is discarded if that transaction rolls back, so numbers
/// are only ever consumed by committed work.
pub async fn allocate_receipt_number(
    conn: &mut SqliteConnection,
    prefix: &str,
) -> LedgerResult<String> {
    sequence::ensure_counter(conn, prefix).await?;
    let n = sequence::allocate(conn, prefix).await?;
    Ok(format_receipt_number(prefix, n))
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use duka_core::{CartLine, CommitReceiptRequest, PaymentClassification};

    #[tokio::test]
    async fn test_next_receipt_id_increments() {
        let fx = Fixture::new().await;

        assert_eq!(fx.ledger.next_receipt_id("POS-01").await.unwrap(), "POS-01-00001");
        assert_eq!(fx.ledger.next_receipt_id("POS-01").await.unwrap(), "POS-01-00002");
        // counters are per prefix
        assert_eq!(fx.ledger.next_receipt_id("POS-02").await.unwrap(), "POS-02-00001");
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_is_not_consumed() {
        let fx = Fixture::new().await;

        let mut tx = fx.db.pool().begin().await.unwrap();
        let number = allocate_receipt_number(&mut tx, "POS-07").await.unwrap();
        assert_eq!(number, "POS-07-00001");
        tx.rollback().await.unwrap();

        // never committed, so the number is still free
        assert_eq!(fx.ledger.next_receipt_id("POS-07").await.unwrap(), "POS-07-00001");
        // committed numbers are never reused
        assert_eq!(fx.ledger.next_receipt_id("POS-07").await.unwrap(), "POS-07-00002");
    }

    #[tokio::test]
    async fn test_next_receipt_id_rejects_bad_prefix() {
        let fx = Fixture::new().await;

        let err = fx.ledger.next_receipt_id("has space").await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_repayment_floors_at_zero() {
        let fx = Fixture::new().await;
        let customer = fx.customer_with_balance(30_000, 100_000).await;

        let after = fx.ledger.record_repayment(&customer.id, 10_000).await.unwrap();
        assert_eq!(after.current_balance_cents, 20_000);

        let after = fx.ledger.record_repayment(&customer.id, 50_000).await.unwrap();
        assert_eq!(after.current_balance_cents, 0);

        let stored = fx.db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.current_balance_cents, 0);
    }

    #[tokio::test]
    async fn test_repayment_rejects_bad_input() {
        let fx = Fixture::new().await;
        let customer = fx.customer_with_balance(30_000, 100_000).await;

        let err = fx.ledger.record_repayment(&customer.id, 0).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation(_))));

        let err = fx.ledger.record_repayment("missing", 100).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::CustomerNotFound(_))));
    }

    #[tokio::test]
    async fn test_payment_settlement() {
        let fx = Fixture::new().await;
        let product = fx.product(10_000, 10).await;

        let mut request = CommitReceiptRequest {
            staff_id: fx.staff.id.clone(),
            shift_id: None,
            customer_id: None,
            payment: PaymentClassification::Mobile {
                subtype: Some("MPESA".into()),
            },
            items: vec![CartLine::new(&product.id, 1)],
            total_cents: 10_000,
            is_return: false,
            reference_code: None,
            checkout_request_id: Some("ws_CO_123".into()),
            origin_station: None,
        };

        let committed = fx.ledger.commit_receipt(request.clone()).await.unwrap();
        assert_eq!(committed.receipt.payment_status, PaymentStatus::Pending);

        let settled = fx
            .ledger
            .update_payment_status("ws_CO_123", PaymentStatus::Completed, Some("QKX1Y2Z3"))
            .await
            .unwrap();
        assert_eq!(settled.payment_status, PaymentStatus::Completed);
        assert_eq!(settled.reference_code.as_deref(), Some("QKX1Y2Z3"));

        // terminal: a second callback cannot flip it
        let err = fx
            .ledger
            .update_payment_status("ws_CO_123", PaymentStatus::Failed, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(CoreError::InvalidPaymentTransition {
                from: PaymentStatus::Completed,
                to: PaymentStatus::Failed
            })
        ));

        // cannot move back to pending at all
        let err = fx
            .ledger
            .update_payment_status("ws_CO_123", PaymentStatus::Pending, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(CoreError::InvalidPaymentTransition { .. })
        ));

        let err = fx
            .ledger
            .update_payment_status("ws_CO_unknown", PaymentStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ReceiptNotFound(_))));

        // a cash sale without a checkout id is already settled
        request.checkout_request_id = None;
        request.payment = PaymentClassification::Cash;
        let cash = fx.ledger.commit_receipt(request).await.unwrap();
        assert_eq!(cash.receipt.payment_status, PaymentStatus::Completed);
    }
}

//! # Shift Lifecycle and Z-Report
//!
//! ```text
//!   open_shift ──► OPEN ──────────── close_shift ──► CLOSED (terminal)
//!                   │  ▲                                 │
//!                   │  └── open_shift again: same shift   └── close again:
//!                   │                                         ShiftAlreadyClosed
//!                   └── get_z_report: live till check, no writes
//! ```
//!
//! Expected cash is computed when asked, never maintained incrementally:
//! `opening_float + Σ cash tenders` over every receipt tied to the shift,
//! returns subtracted.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use duka_core::validation::{validate_amount, validate_id};
use duka_core::{CoreError, Shift, ShiftTotals, ZReport};

use super::Ledger;
use crate::error::LedgerResult;
use crate::repository::shift as shifts;

impl Ledger {
    /// Opens a shift for `staff_id`, or returns the one already open.
    ///
    /// Calling it twice without a close in between yields the same shift
    /// and one row; the second `opening_float_cents` is ignored.
    pub async fn open_shift(&self, staff_id: &str, opening_float_cents: i64) -> LedgerResult<Shift> {
        validate_id("staff_id", staff_id)?;
        validate_amount("opening float", opening_float_cents)?;

        match self.db.staff().get_by_id(staff_id).await? {
            Some(s) if s.is_active => {}
            _ => return Err(CoreError::InvalidStaff(staff_id.to_string()).into()),
        }

        let candidate = Shift {
            id: Uuid::new_v4().to_string(),
            staff_id: staff_id.to_string(),
            opened_at: Utc::now(),
            opening_float_cents,
            closed_at: None,
            closing_actual_cents: None,
            closing_expected_cents: None,
        };

        let mut tx = self.db.pool().begin().await?;
        let created = shifts::insert_open_shift(&mut tx, &candidate).await?;
        let shift = shifts::fetch_open_shift(&mut tx, staff_id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(candidate.id.clone()))?;
        tx.commit().await?;

        if created {
            info!(
                shift_id = %shift.id,
                staff_id = %staff_id,
                opening_float_cents,
                "Shift opened"
            );
        } else {
            debug!(shift_id = %shift.id, staff_id = %staff_id, "Shift already open");
        }

        Ok(shift)
    }

    /// The staff member's open shift, if any.
    pub async fn get_current_shift(&self, staff_id: &str) -> LedgerResult<Option<Shift>> {
        validate_id("staff_id", staff_id)?;
        Ok(self.db.shifts().get_open_for_staff(staff_id).await?)
    }

    /// Live totals for an open shift. Writes nothing.
    ///
    /// `closing_actual_cents` is 0 until the shift is closed, so the
    /// variance shown here is minus the expected cash.
    pub async fn get_z_report(&self, shift_id: &str) -> LedgerResult<ZReport> {
        validate_id("shift_id", shift_id)?;

        // read-only transaction: shift and receipts come from one snapshot
        let mut tx = self.db.pool().begin().await?;

        let shift = shifts::fetch_shift(&mut tx, shift_id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(shift_id.to_string()))?;
        if !shift.is_open() {
            return Err(CoreError::ShiftAlreadyClosed(shift_id.to_string()).into());
        }

        let lines = shifts::tender_lines(&mut tx, shift_id).await?;
        tx.commit().await?;

        let totals = ShiftTotals::accumulate(&lines);
        let report = ZReport::new(&shift, &totals, shift.closing_actual_cents.unwrap_or(0));

        debug!(
            shift_id = %shift_id,
            transactions = report.transaction_count,
            expected_cents = report.closing_expected_cents,
            "Z-report computed"
        );
        Ok(report)
    }

    /// Closes a shift against the counted cash.
    ///
    /// ## What This Does
    /// 1. Stamps `closed_at`, only if still open (first write, takes the lock)
    /// 2. Sums the shift's tenders as of now
    /// 3. Stores counted and expected cash
    /// 4. Returns the final Z-report
    ///
    /// A closed shift is never modified again.
    pub async fn close_shift(&self, shift_id: &str, closing_actual_cents: i64) -> LedgerResult<ZReport> {
        validate_id("shift_id", shift_id)?;
        validate_amount("closing actual", closing_actual_cents)?;

        let mut tx = self.db.pool().begin().await?;

        if !shifts::mark_closed(&mut tx, shift_id, Utc::now()).await? {
            return match shifts::fetch_shift(&mut tx, shift_id).await? {
                None => Err(CoreError::ShiftNotFound(shift_id.to_string()).into()),
                Some(_) => Err(CoreError::ShiftAlreadyClosed(shift_id.to_string()).into()),
            };
        }

        let mut shift = shifts::fetch_shift(&mut tx, shift_id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(shift_id.to_string()))?;

        let lines = shifts::tender_lines(&mut tx, shift_id).await?;
        let totals = ShiftTotals::accumulate(&lines);
        let expected = totals.expected_cash(shift.opening_float_cents);

        shifts::record_close(&mut tx, shift_id, closing_actual_cents, expected).await?;
        tx.commit().await?;

        shift.closing_actual_cents = Some(closing_actual_cents);
        shift.closing_expected_cents = Some(expected);
        let report = ZReport::new(&shift, &totals, closing_actual_cents);

        info!(
            shift_id = %shift_id,
            staff_id = %shift.staff_id,
            expected_cents = report.closing_expected_cents,
            actual_cents = report.closing_actual_cents,
            variance_cents = report.variance_cents,
            transactions = report.transaction_count,
            "Shift closed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Fixture;
    use duka_core::{
        CartLine, CommitReceiptRequest, CoreError, PaymentClassification, ShiftState, Tender,
        TenderMethod,
    };

    fn sale(fx: &Fixture, shift_id: &str, product_id: &str, total_cents: i64) -> CommitReceiptRequest {
        CommitReceiptRequest {
            staff_id: fx.staff.id.clone(),
            shift_id: Some(shift_id.to_string()),
            customer_id: None,
            payment: PaymentClassification::Cash,
            items: vec![CartLine::new(product_id, 1).at_price(total_cents)],
            total_cents,
            is_return: false,
            reference_code: None,
            checkout_request_id: None,
            origin_station: None,
        }
    }

    async fn shift_rows(fx: &Fixture, staff_id: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE staff_id = ?")
            .bind(staff_id)
            .fetch_one(fx.db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_float_plus_cash_sale_reconciles() {
        let fx = Fixture::new().await;
        let product = fx.product(40_000, 10).await;

        let shift = fx.ledger.open_shift(&fx.staff.id, 50_000).await.unwrap();
        fx.ledger
            .commit_receipt(sale(&fx, &shift.id, &product.id, 40_000))
            .await
            .unwrap();

        let live = fx.ledger.get_z_report(&shift.id).await.unwrap();
        assert_eq!(live.status, ShiftState::Open);
        assert_eq!(live.total_cash_sales_cents, 40_000);
        assert_eq!(live.closing_expected_cents, 90_000);
        assert_eq!(live.transaction_count, 1);

        let report = fx.ledger.close_shift(&shift.id, 90_000).await.unwrap();
        assert_eq!(report.status, ShiftState::Closed);
        assert_eq!(report.closing_expected_cents, 90_000);
        assert_eq!(report.closing_actual_cents, 90_000);
        assert_eq!(report.variance_cents, 0);
        assert!(report.closed_at.is_some());
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let fx = Fixture::new().await;

        let first = fx.ledger.open_shift(&fx.staff.id, 50_000).await.unwrap();
        let second = fx.ledger.open_shift(&fx.staff.id, 99_999).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.opening_float_cents, 50_000);
        assert_eq!(shift_rows(&fx, &fx.staff.id).await, 1);

        let current = fx.ledger.get_current_shift(&fx.staff.id).await.unwrap().unwrap();
        assert_eq!(current.id, first.id);
    }

    #[tokio::test]
    async fn test_open_after_close_starts_new_shift() {
        let fx = Fixture::new().await;

        let first = fx.ledger.open_shift(&fx.staff.id, 0).await.unwrap();
        fx.ledger.close_shift(&first.id, 0).await.unwrap();
        assert!(fx.ledger.get_current_shift(&fx.staff.id).await.unwrap().is_none());

        let second = fx.ledger.open_shift(&fx.staff.id, 0).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(shift_rows(&fx, &fx.staff.id).await, 2);
    }

    #[tokio::test]
    async fn test_open_requires_active_staff() {
        let fx = Fixture::new().await;

        let err = fx.ledger.open_shift("ghost", 0).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InvalidStaff(_))));

        fx.db.staff().set_active(&fx.staff.id, false).await.unwrap();
        let err = fx.ledger.open_shift(&fx.staff.id, 0).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InvalidStaff(_))));

        let err = fx.ledger.open_shift("anyone", -1).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_close_is_terminal() {
        let fx = Fixture::new().await;
        let shift = fx.ledger.open_shift(&fx.staff.id, 10_000).await.unwrap();

        fx.ledger.close_shift(&shift.id, 9_500).await.unwrap();
        let err = fx.ledger.close_shift(&shift.id, 1_000_000).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ShiftAlreadyClosed(_))));

        let stored = fx.db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(stored.closing_actual_cents, Some(9_500));
        assert_eq!(stored.closing_expected_cents, Some(10_000));

        let err = fx.ledger.get_z_report(&shift.id).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ShiftAlreadyClosed(_))));
    }

    #[tokio::test]
    async fn test_unknown_shift() {
        let fx = Fixture::new().await;

        let err = fx.ledger.close_shift("missing", 0).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ShiftNotFound(_))));

        let err = fx.ledger.get_z_report("missing").await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ShiftNotFound(_))));
    }

    #[tokio::test]
    async fn test_z_report_buckets_and_returns() {
        let fx = Fixture::new().await;
        let product = fx.product(10_000, 100).await;
        let customer = fx.customer_with_balance(0, 1_000_000).await;
        let shift = fx.ledger.open_shift(&fx.staff.id, 20_000).await.unwrap();

        // cash 30_000
        fx.ledger
            .commit_receipt(sale(&fx, &shift.id, &product.id, 30_000))
            .await
            .unwrap();

        // mobile 15_000
        let mut mobile = sale(&fx, &shift.id, &product.id, 15_000);
        mobile.payment = PaymentClassification::Mobile {
            subtype: Some("MPESA".into()),
        };
        fx.ledger.commit_receipt(mobile).await.unwrap();

        // split: cash 5_000 + credit 7_000, one transaction
        let mut split = sale(&fx, &shift.id, &product.id, 12_000);
        split.customer_id = Some(customer.id.clone());
        split.payment = PaymentClassification::Split {
            tenders: vec![
                Tender::new(TenderMethod::Cash, 5_000),
                Tender::new(TenderMethod::Credit, 7_000),
            ],
        };
        fx.ledger.commit_receipt(split).await.unwrap();

        // cash return 10_000
        let mut ret = sale(&fx, &shift.id, &product.id, 10_000);
        ret.is_return = true;
        fx.ledger.commit_receipt(ret).await.unwrap();

        let report = fx.ledger.get_z_report(&shift.id).await.unwrap();
        assert_eq!(report.total_cash_sales_cents, 30_000 + 5_000 - 10_000);
        assert_eq!(report.total_mobile_sales_cents, 15_000);
        assert_eq!(report.total_credit_sales_cents, 7_000);
        assert_eq!(report.transaction_count, 4);
        assert_eq!(report.closing_expected_cents, 20_000 + 25_000);

        // the live report wrote nothing
        let stored = fx.db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert!(stored.is_open());
        assert_eq!(stored.closing_expected_cents, None);

        let report = fx.ledger.close_shift(&shift.id, 44_000).await.unwrap();
        assert_eq!(report.variance_cents, -1_000);

        let receipts = fx.ledger.receipts_for_shift(&shift.id).await.unwrap();
        assert_eq!(receipts.len(), 4);
    }

    #[tokio::test]
    async fn test_pending_mobile_counts_in_z_report() {
        let fx = Fixture::new().await;
        let product = fx.product(10_000, 100).await;
        let shift = fx.ledger.open_shift(&fx.staff.id, 0).await.unwrap();

        let mut pending = sale(&fx, &shift.id, &product.id, 10_000);
        pending.payment = PaymentClassification::Mobile { subtype: None };
        pending.checkout_request_id = Some("ws_CO_pending".into());
        fx.ledger.commit_receipt(pending).await.unwrap();

        let report = fx.ledger.get_z_report(&shift.id).await.unwrap();
        assert_eq!(report.total_mobile_sales_cents, 10_000);
        assert_eq!(report.transaction_count, 1);
    }
}

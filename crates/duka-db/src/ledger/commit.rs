//! # Receipt Commit
//!
//! Turns a cart into a receipt, moving stock and customer credit with it,
//! as one SQLite transaction.
//!
//! ## Commit Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      commit_receipt(request)                            │
//! │                                                                         │
//! │  validate_commit()                       stateless, before BEGIN       │
//! │  BEGIN                                                                  │
//! │   1. ensure_counter(station)             first write: takes the lock   │
//! │   2. staff exists and is active?         → InvalidStaff                │
//! │   3. shift (if any) exists and is open?  → ShiftNotFound / Closed      │
//! │   4. customer exists? credit fits?       → CustomerNotFound /          │
//! │                                            DebtLimitExceeded           │
//! │   5. products exist? snapshot prices     → ProductNotFound             │
//! │   ───────────────── no writes visible above this line ───────────────   │
//! │   6. allocate receipt number                                            │
//! │   7. insert receipt + tenders + items                                   │
//! │   8. stock += delta per line             (may go negative: oversold)   │
//! │   9. balance += credit delta             (guarded again in SQL)        │
//! │  COMMIT                                                                 │
//! │  spawn receipt sinks                     errors logged, never raised   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any `?` between BEGIN and COMMIT drops the transaction, which rolls back
//! everything including the counter increment.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use duka_core::ledger::{check_debt_limit, credit_delta};
use duka_core::validation::validate_commit;
use duka_core::{
    CommitReceiptRequest, CommittedReceipt, CoreError, OversoldProduct, Receipt, SaleItem,
};

use super::{allocate_receipt_number, hooks, Ledger};
use crate::error::LedgerResult;
use crate::repository::{customer, product, receipt, sequence, shift, staff};

/// Credit movement decided during the precondition phase.
struct CreditMove {
    customer_id: String,
    delta_cents: i64,
    balance_cents: i64,
    limit_cents: i64,
}

impl Ledger {
    /// Commits a sale or return.
    ///
    /// ## Errors
    /// - `Validation` / `InvalidPayment` / `CustomerRequired` - malformed request
    /// - `InvalidStaff` - unknown or deactivated staff
    /// - `ShiftNotFound` / `ShiftAlreadyClosed` - bad shift reference
    /// - `CustomerNotFound` - unknown customer
    /// - `DebtLimitExceeded` - credit portion would breach the limit
    /// - `ProductNotFound` - unknown product on a cart line
    /// - `Db(Conflict)` - store contention; retry the whole call
    ///
    /// On any error nothing is written.
    pub async fn commit_receipt(
        &self,
        request: CommitReceiptRequest,
    ) -> LedgerResult<CommittedReceipt> {
        validate_commit(&request)?;

        let station = request
            .origin_station
            .clone()
            .unwrap_or_else(|| self.station.clone());
        let is_return = request.is_return;
        let now = Utc::now();
        let receipt_id = Uuid::new_v4().to_string();

        debug!(
            station = %station,
            staff_id = %request.staff_id,
            items = request.items.len(),
            total_cents = request.total_cents,
            is_return,
            "Committing receipt"
        );

        let mut tx = self.db.pool().begin().await?;

        sequence::ensure_counter(&mut tx, &station).await?;

        match staff::fetch_staff(&mut tx, &request.staff_id).await? {
            Some(s) if s.is_active => {}
            _ => return Err(CoreError::InvalidStaff(request.staff_id.clone()).into()),
        }

        if let Some(shift_id) = &request.shift_id {
            let current = shift::fetch_shift(&mut tx, shift_id)
                .await?
                .ok_or_else(|| CoreError::ShiftNotFound(shift_id.clone()))?;
            if !current.is_open() {
                return Err(CoreError::ShiftAlreadyClosed(shift_id.clone()).into());
            }
        }

        let mut credit: Option<CreditMove> = None;
        if let Some(customer_id) = &request.customer_id {
            let customer = customer::fetch_customer(&mut tx, customer_id)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(customer_id.clone()))?;

            let portion = request.payment.credit_portion(request.total_cents);
            if portion > 0 {
                let delta = credit_delta(portion, is_return);
                check_debt_limit(&customer, delta)?;
                credit = Some(CreditMove {
                    customer_id: customer.id,
                    delta_cents: delta,
                    balance_cents: customer.current_balance_cents,
                    limit_cents: customer.debt_limit_cents,
                });
            }
        }

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let p = product::fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let unit_price_cents = line
                .unit_price_cents
                .unwrap_or_else(|| p.price_for_quantity(line.quantity).cents());

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                receipt_id: receipt_id.clone(),
                product_id: p.id,
                staff_id: request.staff_id.clone(),
                name_snapshot: p.name,
                quantity: line.quantity,
                unit_price_cents,
                is_return,
                return_reason: line.return_reason.clone(),
                created_at: now,
            });
        }

        let receipt_number = allocate_receipt_number(&mut tx, &station).await?;
        let receipt = Receipt {
            id: receipt_id,
            receipt_number,
            created_at: now,
            shift_id: request.shift_id.clone(),
            staff_id: request.staff_id.clone(),
            customer_id: request.customer_id.clone(),
            total_cents: request.total_cents,
            payment_status: request.initial_status(),
            payment: request.payment,
            reference_code: request.reference_code,
            checkout_request_id: request.checkout_request_id,
            is_return,
            origin_station: station,
        };

        receipt::insert_receipt(&mut tx, &receipt).await?;

        let mut oversold: Vec<OversoldProduct> = Vec::new();
        for item in &items {
            receipt::insert_sale_item(&mut tx, item).await?;

            let stock = product::apply_stock_delta(&mut tx, &item.product_id, item.stock_delta()).await?;
            if stock < 0 {
                match oversold.iter_mut().find(|o| o.product_id == item.product_id) {
                    Some(existing) => existing.stock_quantity = stock,
                    None => oversold.push(OversoldProduct {
                        product_id: item.product_id.clone(),
                        stock_quantity: stock,
                    }),
                }
            }
        }

        if let Some(c) = &credit {
            let applied = customer::apply_balance_delta(&mut tx, &c.customer_id, c.delta_cents).await?;
            if applied.is_none() {
                return Err(CoreError::DebtLimitExceeded {
                    customer_id: c.customer_id.clone(),
                    balance_cents: c.balance_cents,
                    attempted_cents: c.delta_cents,
                    limit_cents: c.limit_cents,
                }
                .into());
            }
        }

        tx.commit().await?;

        info!(
            receipt_number = %receipt.receipt_number,
            total_cents = receipt.total_cents,
            payment = ?receipt.payment.kind(),
            is_return,
            "Receipt committed"
        );

        for o in &oversold {
            warn!(
                product_id = %o.product_id,
                stock_quantity = o.stock_quantity,
                receipt_number = %receipt.receipt_number,
                "Product oversold"
            );
        }

        let committed = CommittedReceipt {
            receipt,
            items,
            oversold,
        };

        hooks::dispatch(&self.sinks, &committed);

        Ok(committed)
    }
}

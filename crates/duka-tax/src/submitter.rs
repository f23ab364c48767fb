//! # Tax Submitter
//!
//! Posts a [`TaxInvoice`] for every committed receipt.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CommittedReceipt                                                      │
//! │       │                                                                 │
//! │       ├── disabled / no URL ──────────────────────► Skipped            │
//! │       │                                                                 │
//! │       ├── customer? ──► customers.get_by_id ──► buyer kra_pin          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TaxInvoice::from_committed ──► POST JSON ──► 2xx ──► Submitted        │
//! │                                         └──► other ──► Rejected        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no retry queue. The ledger logs the error and the receipt can
//! be re-exported from the reporting side.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use duka_core::CommittedReceipt;
use duka_db::{Database, ReceiptSink, SinkError};

use crate::config::TaxConfig;
use crate::error::{TaxError, TaxResult};
use crate::payload::TaxInvoice;

/// What happened to one receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Submission is switched off or has nowhere to go.
    Skipped,
    /// The endpoint accepted the invoice.
    Submitted { status: u16 },
}

/// HTTP client for the tax authority invoice endpoint.
///
/// ## Usage
/// ```rust,ignore
/// let submitter = TaxSubmitter::new(TaxConfig::load(None)?, db.clone())?;
/// let ledger = Ledger::new(db, "POS-01")?.with_sink(Arc::new(submitter));
/// ```
#[derive(Debug, Clone)]
pub struct TaxSubmitter {
    client: Client,
    config: TaxConfig,
    db: Database,
}

impl TaxSubmitter {
    /// Creates a submitter with the configured request timeout.
    pub fn new(config: TaxConfig, db: Database) -> TaxResult<Self> {
        config.validate()?;

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(TaxSubmitter { client, config, db })
    }

    pub fn config(&self) -> &TaxConfig {
        &self.config
    }

    /// Builds the invoice for a receipt, resolving the buyer's PIN.
    pub async fn build_invoice(&self, committed: &CommittedReceipt) -> TaxResult<TaxInvoice> {
        let buyer_pin = match &committed.receipt.customer_id {
            Some(customer_id) => self
                .db
                .customers()
                .get_by_id(customer_id)
                .await?
                .and_then(|customer| customer.kra_pin),
            None => None,
        };

        Ok(TaxInvoice::from_committed(
            committed,
            &self.config.seller_pin,
            buyer_pin.as_deref(),
            self.config.vat_rate(),
        ))
    }

    /// Submits one receipt.
    ///
    /// ## Returns
    /// * `Ok(Skipped)` - submission disabled or no URL configured
    /// * `Ok(Submitted)` - endpoint answered 2xx
    /// * `Err(TaxError::Rejected)` - endpoint answered anything else
    /// * `Err(TaxError::Http)` - connect failure or timeout
    pub async fn submit(&self, committed: &CommittedReceipt) -> TaxResult<SubmissionOutcome> {
        let url = match (&self.config.submission_url, self.config.enabled) {
            (Some(url), true) => url,
            _ => {
                debug!(
                    receipt_number = %committed.receipt.receipt_number,
                    "Tax submission disabled, skipping"
                );
                return Ok(SubmissionOutcome::Skipped);
            }
        };

        let invoice = self.build_invoice(committed).await?;

        debug!(
            invoice_number = %invoice.invoice_number,
            items = invoice.items.len(),
            "Posting tax invoice"
        );

        let response = self.client.post(url).json(&invoice).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TaxError::Rejected {
                invoice_number: invoice.invoice_number,
                status: status.as_u16(),
                body,
            });
        }

        info!(
            invoice_number = %invoice.invoice_number,
            status = status.as_u16(),
            "Tax invoice accepted"
        );

        Ok(SubmissionOutcome::Submitted {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl ReceiptSink for TaxSubmitter {
    fn name(&self) -> &str {
        "tax"
    }

    async fn receipt_committed(&self, committed: &CommittedReceipt) -> Result<(), SinkError> {
        self.submit(committed).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use duka_core::{
        CartLine, CommitReceiptRequest, Customer, PaymentClassification, Product, StaffRole,
    };
    use duka_db::{DbConfig, Ledger};
    use uuid::Uuid;

    fn enabled_config(url: String) -> TaxConfig {
        TaxConfig {
            enabled: true,
            submission_url: Some(url),
            seller_pin: "P051234567X".into(),
            timeout_secs: 2,
            ..TaxConfig::default()
        }
    }

    struct Shop {
        db: Database,
        staff_id: String,
        product_id: String,
    }

    async fn shop() -> Shop {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let staff = db
            .staff()
            .create("cashier", None, StaffRole::Cashier)
            .await
            .unwrap();

        let now = Utc::now();
        let product = db
            .products()
            .insert(&Product {
                id: Uuid::new_v4().to_string(),
                barcode: "6161101600019".into(),
                name: "Unga 2kg".into(),
                price_buying_cents: 9_000,
                price_selling_cents: 11_600,
                wholesale_price_cents: None,
                wholesale_threshold: None,
                tax_rate_bps: 1600,
                stock_quantity: 10,
                min_stock_alert: 5,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        Shop {
            db,
            staff_id: staff.id,
            product_id: product.id,
        }
    }

    fn sale(shop: &Shop, customer_id: Option<String>) -> CommitReceiptRequest {
        CommitReceiptRequest {
            staff_id: shop.staff_id.clone(),
            shift_id: None,
            customer_id,
            payment: PaymentClassification::Cash,
            items: vec![CartLine::new(&shop.product_id, 1)],
            total_cents: 11_600,
            is_return: false,
            reference_code: None,
            checkout_request_id: None,
            origin_station: None,
        }
    }

    #[tokio::test]
    async fn test_submit_accepted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoices")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"invoice_number": "POS-01-00001", "seller_pin": "P051234567X",
                    "total_amount": "116.00", "vat_amount": "16.00",
                    "transaction_type": "sale"}"#
                    .into(),
            ))
            .with_status(201)
            .create_async()
            .await;

        let shop = shop().await;
        let ledger = Ledger::new(shop.db.clone(), "POS-01").unwrap();
        let committed = ledger.commit_receipt(sale(&shop, None)).await.unwrap();

        let submitter =
            TaxSubmitter::new(enabled_config(format!("{}/invoices", server.url())), shop.db.clone())
                .unwrap();
        let outcome = submitter.submit(&committed).await.unwrap();

        assert_eq!(outcome, SubmissionOutcome::Submitted { status: 201 });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/invoices")
            .with_status(500)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let shop = shop().await;
        let ledger = Ledger::new(shop.db.clone(), "POS-01").unwrap();
        let committed = ledger.commit_receipt(sale(&shop, None)).await.unwrap();

        let submitter =
            TaxSubmitter::new(enabled_config(format!("{}/invoices", server.url())), shop.db.clone())
                .unwrap();
        let err = submitter.submit(&committed).await.unwrap_err();

        match err {
            TaxError::Rejected { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disabled_is_skipped() {
        let shop = shop().await;
        let ledger = Ledger::new(shop.db.clone(), "POS-01").unwrap();
        let committed = ledger.commit_receipt(sale(&shop, None)).await.unwrap();

        let submitter = TaxSubmitter::new(TaxConfig::default(), shop.db.clone()).unwrap();
        assert_eq!(
            submitter.submit(&committed).await.unwrap(),
            SubmissionOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_buyer_pin_from_customer() {
        let shop = shop().await;
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: "Hotel Jirani".into(),
            phone: None,
            email: None,
            kra_pin: Some("A012345678Z".into()),
            current_balance_cents: 0,
            debt_limit_cents: 0,
            created_at: now,
            updated_at: now,
        };
        shop.db.customers().insert(&customer).await.unwrap();

        let ledger = Ledger::new(shop.db.clone(), "POS-01").unwrap();
        let committed = ledger
            .commit_receipt(sale(&shop, Some(customer.id.clone())))
            .await
            .unwrap();

        let submitter = TaxSubmitter::new(
            enabled_config("http://localhost:1/invoices".into()),
            shop.db.clone(),
        )
        .unwrap();
        let invoice = submitter.build_invoice(&committed).await.unwrap();
        assert_eq!(invoice.buyer_pin.as_deref(), Some("A012345678Z"));
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_fail_commit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoices")
            .with_status(503)
            .create_async()
            .await;

        let shop = shop().await;
        let submitter =
            TaxSubmitter::new(enabled_config(format!("{}/invoices", server.url())), shop.db.clone())
                .unwrap();
        let ledger = Ledger::new(shop.db.clone(), "POS-01")
            .unwrap()
            .with_sink(Arc::new(submitter));

        let committed = ledger.commit_receipt(sale(&shop, None)).await.unwrap();
        assert_eq!(committed.receipt.receipt_number, "POS-01-00001");

        // The sink runs on a background task.
        for _ in 0..100 {
            if mock.matched_async().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        mock.assert_async().await;

        let stored = shop
            .db
            .receipts()
            .get_by_number("POS-01-00001")
            .await
            .unwrap();
        assert!(stored.is_some());
    }
}

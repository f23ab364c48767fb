//! # Tax Invoice Payload
//!
//! The JSON document posted to the tax authority for each receipt.
//!
//! ```json
//! {
//!   "invoice_number": "POS-01-00042",
//!   "invoice_date": "2026-03-14T09:30:00",
//!   "seller_pin": "P051234567X",
//!   "buyer_pin": null,
//!   "total_amount": "116.00",
//!   "vat_amount": "16.00",
//!   "items": [
//!     { "description": "Unga 2kg", "quantity": 1, "unit_price": "116.00",
//!       "amount": "116.00", "vat_rate": "16" }
//!   ],
//!   "receipt_type": "normal",
//!   "transaction_type": "sale"
//! }
//! ```
//!
//! Amounts are decimal strings with two places so no float ever touches a
//! shilling on the way out.

use serde::{Deserialize, Serialize};

use duka_core::types::TaxRate;
use duka_core::{CommittedReceipt, Money, SaleItem};

/// Timestamp layout expected by the endpoint (local wall clock, no zone).
const INVOICE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Whether the invoice records a sale or reverses one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    CreditNote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptType {
    Normal,
}

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price: String,
    pub amount: String,
    pub vat_rate: String,
}

/// Invoice for one committed receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxInvoice {
    pub invoice_number: String,
    pub invoice_date: String,
    pub seller_pin: String,
    pub buyer_pin: Option<String>,
    pub total_amount: String,
    pub vat_amount: String,
    pub items: Vec<InvoiceLine>,
    pub receipt_type: ReceiptType,
    pub transaction_type: TransactionType,
}

impl TaxInvoice {
    /// Builds the invoice for a committed receipt.
    ///
    /// VAT is the share of the tax-inclusive total at `rate`, i.e.
    /// `total * rate / (10000 + rate)`, rounded half up in integer cents.
    /// A blank `buyer_pin` is sent as `null`.
    pub fn from_committed(
        committed: &CommittedReceipt,
        seller_pin: &str,
        buyer_pin: Option<&str>,
        rate: TaxRate,
    ) -> TaxInvoice {
        let receipt = &committed.receipt;
        let total = receipt.total();
        let vat_rate = rate.percent_label();

        let items = committed
            .items
            .iter()
            .map(|item| InvoiceLine::from_item(item, &vat_rate))
            .collect();

        TaxInvoice {
            invoice_number: receipt.receipt_number.clone(),
            invoice_date: receipt.created_at.format(INVOICE_DATE_FORMAT).to_string(),
            seller_pin: seller_pin.trim().to_string(),
            buyer_pin: buyer_pin
                .map(str::trim)
                .filter(|pin| !pin.is_empty())
                .map(str::to_string),
            total_amount: decimal(total),
            vat_amount: decimal(total.inclusive_tax(rate)),
            items,
            receipt_type: ReceiptType::Normal,
            transaction_type: if receipt.is_return {
                TransactionType::CreditNote
            } else {
                TransactionType::Sale
            },
        }
    }
}

impl InvoiceLine {
    fn from_item(item: &SaleItem, vat_rate: &str) -> InvoiceLine {
        InvoiceLine {
            description: item.name_snapshot.clone(),
            quantity: item.quantity,
            unit_price: decimal(item.unit_price()),
            amount: decimal(item.line_total()),
            vat_rate: vat_rate.to_string(),
        }
    }
}

/// `Money` as a plain two-place decimal, e.g. `"1234.50"`.
fn decimal(amount: Money) -> String {
    let cents = amount.cents();
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use duka_core::{PaymentClassification, PaymentStatus, Receipt};

    fn committed(total_cents: i64, is_return: bool) -> CommittedReceipt {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        let item = |name: &str, qty: i64, price: i64| SaleItem {
            id: format!("item-{name}"),
            receipt_id: "r-1".into(),
            product_id: format!("p-{name}"),
            staff_id: "s-1".into(),
            name_snapshot: name.into(),
            quantity: qty,
            unit_price_cents: price,
            is_return,
            return_reason: None,
            created_at,
        };

        CommittedReceipt {
            receipt: Receipt {
                id: "r-1".into(),
                receipt_number: "POS-01-00042".into(),
                created_at,
                shift_id: None,
                staff_id: "s-1".into(),
                customer_id: None,
                total_cents,
                payment: PaymentClassification::Cash,
                payment_status: PaymentStatus::Completed,
                reference_code: None,
                checkout_request_id: None,
                is_return,
                origin_station: "POS-01".into(),
            },
            items: vec![item("Unga 2kg", 2, 18_000), item("Salt", 1, 3_050)],
            oversold: vec![],
        }
    }

    #[test]
    fn test_sale_invoice() {
        let invoice = TaxInvoice::from_committed(
            &committed(39_050, false),
            " P051234567X ",
            None,
            TaxRate::from_bps(1600),
        );

        assert_eq!(invoice.invoice_number, "POS-01-00042");
        assert_eq!(invoice.invoice_date, "2026-03-14T09:30:00");
        assert_eq!(invoice.seller_pin, "P051234567X");
        assert_eq!(invoice.total_amount, "390.50");
        // 39_050 * 1600 / 11600 = 5386.2
        assert_eq!(invoice.vat_amount, "53.86");
        assert_eq!(invoice.transaction_type, TransactionType::Sale);

        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.items[0].unit_price, "180.00");
        assert_eq!(invoice.items[0].amount, "360.00");
        assert_eq!(invoice.items[1].amount, "30.50");
        assert_eq!(invoice.items[1].vat_rate, "16");
    }

    #[test]
    fn test_return_is_credit_note() {
        let invoice = TaxInvoice::from_committed(
            &committed(11_600, true),
            "P051234567X",
            Some("A012345678Z"),
            TaxRate::from_bps(1600),
        );

        assert_eq!(invoice.transaction_type, TransactionType::CreditNote);
        assert_eq!(invoice.buyer_pin.as_deref(), Some("A012345678Z"));
        assert_eq!(invoice.total_amount, "116.00");
        assert_eq!(invoice.vat_amount, "16.00");
    }

    #[test]
    fn test_blank_buyer_pin_is_null() {
        let invoice = TaxInvoice::from_committed(
            &committed(100, false),
            "P051234567X",
            Some("  "),
            TaxRate::zero(),
        );
        assert!(invoice.buyer_pin.is_none());
        assert_eq!(invoice.vat_amount, "0.00");
        assert_eq!(invoice.items[0].vat_rate, "0");
    }

    #[test]
    fn test_json_shape() {
        let invoice = TaxInvoice::from_committed(
            &committed(11_600, true),
            "P051234567X",
            None,
            TaxRate::from_bps(1600),
        );
        let json = serde_json::to_value(&invoice).unwrap();

        assert_eq!(json["receipt_type"], "normal");
        assert_eq!(json["transaction_type"], "credit_note");
        assert!(json["buyer_pin"].is_null());
        assert_eq!(json["items"][0]["description"], "Unga 2kg");
        assert_eq!(json["items"][0]["quantity"], 2);
    }

    #[test]
    fn test_decimal_formatting() {
        assert_eq!(decimal(Money::from_cents(5)), "0.05");
        assert_eq!(decimal(Money::from_cents(-1_250)), "-12.50");
        assert_eq!(decimal(Money::zero()), "0.00");
    }
}

//! # Validation Module
//!
//! Input checks that run before a ledger transaction is opened.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (pure, before BEGIN)                             │
//! │  ├── Cart shape, quantities, prices                                    │
//! │  └── Payment breakdown adds up to the total                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger transaction (duka-db)                                 │
//! │  ├── Staff active, customer exists, products exist                     │
//! │  └── Debt limit against the fresh balance                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE receipt_number / barcode                                   │
//! │  ├── CHECK quantity > 0                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{CartLine, CommitReceiptRequest, PaymentClassification, TenderMethod};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_RECEIPT_TOTAL};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a station prefix used in receipt numbers.
///
/// ## Rules
/// - 1 to 16 characters
/// - ASCII letters, digits and `-` only
///
/// ```rust
/// use duka_core::validation::validate_station_prefix;
///
/// assert!(validate_station_prefix("POS-01").is_ok());
/// assert!(validate_station_prefix("").is_err());
/// assert!(validate_station_prefix("POS 01").is_err());
/// ```
pub fn validate_station_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(ValidationError::Required {
            field: "station".to_string(),
        });
    }

    if prefix.len() > 16 {
        return Err(ValidationError::TooLong {
            field: "station".to_string(),
            max: 16,
        });
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "station".to_string(),
            reason: "must contain only letters, digits and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates that an identifier is present.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: `1..=MAX_ITEM_QUANTITY`.
///
/// Returns are expressed with `is_return`, never with a negative quantity.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount that may be zero but not negative.
pub fn validate_non_negative(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an amount that must be strictly positive.
pub fn validate_positive(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a caller-supplied amount: `0..=MAX_RECEIPT_TOTAL`.
pub fn validate_amount(field: &str, cents: i64) -> ValidationResult<()> {
    validate_non_negative(field, cents)?;

    if cents > MAX_RECEIPT_TOTAL {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_RECEIPT_TOTAL,
        });
    }

    Ok(())
}

// =============================================================================
// Cart and Payment Validators
// =============================================================================

/// Validates every cart line and the cart size.
pub fn validate_cart(items: &[CartLine]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if items.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    for line in items {
        validate_id("product_id", &line.product_id)?;
        validate_quantity(line.quantity)?;
        if let Some(price) = line.unit_price_cents {
            validate_amount("unit price", price)?;
        }
    }

    Ok(())
}

/// Validates a payment breakdown against the receipt total.
///
/// ## Rules
/// - SPLIT needs at least one tender, each strictly positive
/// - no tender above `MAX_RECEIPT_TOTAL`, and the sum must not overflow
/// - SPLIT tenders must sum to exactly the total
/// - Single-method payments always cover the total
pub fn validate_payment(payment: &PaymentClassification, total_cents: i64) -> CoreResult<()> {
    let PaymentClassification::Split { tenders } = payment else {
        return Ok(());
    };

    if tenders.is_empty() {
        return Err(CoreError::invalid_payment("split payment has no tenders"));
    }

    for tender in tenders {
        if tender.amount_cents <= 0 {
            return Err(CoreError::invalid_payment(format!(
                "{} tender must be positive, got {}",
                tender.method, tender.amount_cents
            )));
        }
        validate_amount("tender", tender.amount_cents)?;
        if tender.method != TenderMethod::Mobile && tender.subtype.is_some() {
            return Err(CoreError::invalid_payment(format!(
                "{} tender cannot carry a subtype",
                tender.method
            )));
        }
    }

    let sum = tenders
        .iter()
        .try_fold(0i64, |acc, t| acc.checked_add(t.amount_cents))
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "split tenders".to_string(),
            min: 0,
            max: MAX_RECEIPT_TOTAL,
        })?;
    if sum != total_cents {
        return Err(ValidationError::Mismatch {
            field: "split tenders".to_string(),
            expected: total_cents,
            actual: sum,
        }
        .into());
    }

    Ok(())
}

/// Runs every stateless check on a commit request.
///
/// ## User Workflow
/// ```text
/// commit_receipt(request)
///      │
///      ▼
/// validate_commit(request) ← THIS FUNCTION (no transaction yet)
///      │
///      ├── staff_id empty?            → Required
///      ├── cart empty / qty <= 0?     → Required / MustBePositive
///      ├── total negative / too big?  → MustNotBeNegative / OutOfRange
///      ├── split doesn't add up?      → Mismatch
///      ├── credit without customer?   → CustomerRequired
///      │
///      └── OK → BEGIN transaction
/// ```
pub fn validate_commit(request: &CommitReceiptRequest) -> CoreResult<()> {
    validate_id("staff_id", &request.staff_id)?;
    validate_cart(&request.items)?;
    validate_amount("total", request.total_cents)?;
    validate_payment(&request.payment, request.total_cents)?;

    if request.payment.involves_credit() && request.customer_id.is_none() {
        return Err(CoreError::CustomerRequired);
    }

    if let Some(station) = &request.origin_station {
        validate_station_prefix(station)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tender;

    fn request(payment: PaymentClassification, total: i64) -> CommitReceiptRequest {
        CommitReceiptRequest {
            staff_id: "staff-1".into(),
            shift_id: None,
            customer_id: None,
            payment,
            items: vec![CartLine::new("prod-1", 1)],
            total_cents: total,
            is_return: false,
            reference_code: None,
            checkout_request_id: None,
            origin_station: None,
        }
    }

    #[test]
    fn test_validate_station_prefix() {
        assert!(validate_station_prefix("POS-01").is_ok());
        assert!(validate_station_prefix("TILL2").is_ok());
        assert!(validate_station_prefix("").is_err());
        assert!(validate_station_prefix("POS_01").is_err());
        assert!(validate_station_prefix(&"A".repeat(17)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cart() {
        assert!(validate_cart(&[]).is_err());
        assert!(validate_cart(&[CartLine::new("p", 2)]).is_ok());
        assert!(validate_cart(&[CartLine::new("", 2)]).is_err());
        assert!(validate_cart(&[CartLine::new("p", 1).at_price(-1)]).is_err());

        let too_many: Vec<CartLine> = (0..=MAX_CART_ITEMS).map(|_| CartLine::new("p", 1)).collect();
        assert!(validate_cart(&too_many).is_err());
    }

    #[test]
    fn test_split_must_sum_to_total() {
        let split = PaymentClassification::Split {
            tenders: vec![
                Tender::new(TenderMethod::Cash, 300),
                Tender::new(TenderMethod::Mobile, 100).with_subtype("MPESA"),
            ],
        };
        assert!(validate_payment(&split, 400).is_ok());
        assert!(matches!(
            validate_payment(&split, 500),
            Err(CoreError::Validation(ValidationError::Mismatch { .. }))
        ));
    }

    #[test]
    fn test_split_rejects_bad_tenders() {
        let empty = PaymentClassification::Split { tenders: vec![] };
        assert!(validate_payment(&empty, 0).is_err());

        let zero = PaymentClassification::Split {
            tenders: vec![Tender::new(TenderMethod::Cash, 0)],
        };
        assert!(validate_payment(&zero, 0).is_err());

        let cash_subtype = PaymentClassification::Split {
            tenders: vec![Tender::new(TenderMethod::Cash, 100).with_subtype("MPESA")],
        };
        assert!(validate_payment(&cash_subtype, 100).is_err());
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount("total", 0).is_ok());
        assert!(validate_amount("total", MAX_RECEIPT_TOTAL).is_ok());
        assert!(matches!(
            validate_amount("total", MAX_RECEIPT_TOTAL + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_amount("total", -1).is_err());
    }

    #[test]
    fn test_split_with_huge_tenders_is_rejected() {
        // would wrap to 0 with unchecked addition
        let wrapping = PaymentClassification::Split {
            tenders: vec![
                Tender::new(TenderMethod::Cash, i64::MAX),
                Tender::new(TenderMethod::Cash, i64::MAX),
                Tender::new(TenderMethod::Cash, 2),
            ],
        };
        assert!(matches!(
            validate_payment(&wrapping, 0),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let overflowing = PaymentClassification::Split {
            tenders: vec![
                Tender::new(TenderMethod::Cash, i64::MAX),
                Tender::new(TenderMethod::Cash, 11),
            ],
        };
        assert!(validate_payment(&overflowing, 10).is_err());

        // many legs each under the cap still sum exactly
        let many = PaymentClassification::Split {
            tenders: vec![Tender::new(TenderMethod::Cash, MAX_RECEIPT_TOTAL); 3],
        };
        assert!(validate_payment(&many, 3 * MAX_RECEIPT_TOTAL).is_ok());
        // ...but such a total is refused by the commit check
        let req = request(many, 3 * MAX_RECEIPT_TOTAL);
        assert!(matches!(
            validate_commit(&req),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_commit_rejects_oversized_total_and_price() {
        let req = request(PaymentClassification::Cash, i64::MAX);
        assert!(validate_commit(&req).is_err());

        let mut req = request(PaymentClassification::Cash, 100);
        req.items = vec![CartLine::new("prod-1", 1).at_price(MAX_RECEIPT_TOTAL + 1)];
        assert!(validate_commit(&req).is_err());
    }

    #[test]
    fn test_credit_requires_customer() {
        let req = request(PaymentClassification::Credit, 100);
        assert!(matches!(validate_commit(&req), Err(CoreError::CustomerRequired)));

        let mut req = request(PaymentClassification::Credit, 100);
        req.customer_id = Some("cust-1".into());
        assert!(validate_commit(&req).is_ok());
    }

    #[test]
    fn test_commit_rejects_negative_total() {
        let req = request(PaymentClassification::Cash, -100);
        assert!(validate_commit(&req).is_err());
    }
}

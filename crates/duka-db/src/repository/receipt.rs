//! # Receipt Repository
//!
//! Receipts, their tender legs, and their sale items.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receipts          one row per sale/return                             │
//! │  ├── payment_kind     CASH | MOBILE | CREDIT | SPLIT                   │
//! │  └── payment_subtype  e.g. MPESA (single-method MOBILE only)           │
//! │                                                                         │
//! │  receipt_tenders   one row per payment leg, position-ordered           │
//! │                    (single-method receipts have exactly one)           │
//! │                                                                         │
//! │  sale_items        one row per cart line, price snapshotted            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads reassemble a [`Receipt`] from the row plus its tenders, so the
//! payment classification is never stored as a free-form blob.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use duka_core::{
    PaymentClassification, PaymentKind, PaymentStatus, Receipt, SaleItem, Tender,
};

const RECEIPT_COLUMNS: &str = r#"
    id, receipt_number, created_at, shift_id, staff_id, customer_id,
    total_cents, payment_kind, payment_subtype, payment_status,
    reference_code, checkout_request_id, is_return, origin_station
"#;

const SALE_ITEM_COLUMNS: &str = r#"
    id, receipt_id, product_id, staff_id, name_snapshot, quantity,
    unit_price_cents, is_return, return_reason, created_at
"#;

/// A `receipts` row before its tenders are attached.
#[derive(Debug, FromRow)]
struct ReceiptRow {
    id: String,
    receipt_number: String,
    created_at: DateTime<Utc>,
    shift_id: Option<String>,
    staff_id: String,
    customer_id: Option<String>,
    total_cents: i64,
    payment_kind: PaymentKind,
    payment_subtype: Option<String>,
    payment_status: PaymentStatus,
    reference_code: Option<String>,
    checkout_request_id: Option<String>,
    is_return: bool,
    origin_station: String,
}

impl ReceiptRow {
    fn into_receipt(self, tenders: Vec<Tender>) -> Receipt {
        Receipt {
            id: self.id,
            receipt_number: self.receipt_number,
            created_at: self.created_at,
            shift_id: self.shift_id,
            staff_id: self.staff_id,
            customer_id: self.customer_id,
            total_cents: self.total_cents,
            payment: PaymentClassification::from_stored(
                self.payment_kind,
                self.payment_subtype,
                tenders,
            ),
            payment_status: self.payment_status,
            reference_code: self.reference_code,
            checkout_request_id: self.checkout_request_id,
            is_return: self.is_return,
            origin_station: self.origin_station,
        }
    }
}

/// Repository for receipt database operations.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    /// Creates a new ReceiptRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// Gets a receipt by ID, payment legs included.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Receipt>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Some(hydrate(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    /// Gets a receipt by its printed number, e.g. `POS-01-00042`.
    pub async fn get_by_number(&self, receipt_number: &str) -> DbResult<Option<Receipt>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE receipt_number = ?"
        ))
        .bind(receipt_number)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Some(hydrate(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    /// Gets the receipt awaiting a given mobile-money checkout callback.
    pub async fn get_by_checkout_request(&self, checkout_request_id: &str) -> DbResult<Option<Receipt>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_checkout_request(&mut conn, checkout_request_id).await
    }

    /// Sale items of a receipt in insertion order.
    pub async fn items(&self, receipt_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE receipt_id = ? ORDER BY rowid"
        ))
        .bind(receipt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// All receipts tied to a shift, oldest first.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<Receipt>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE shift_id = ? ORDER BY created_at, receipt_number"
        ))
        .bind(shift_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut receipts = Vec::with_capacity(rows.len());
        for row in rows {
            receipts.push(hydrate(&mut conn, row).await?);
        }

        debug!(shift_id = %shift_id, count = receipts.len(), "Loaded shift receipts");
        Ok(receipts)
    }

    /// Number of receipts ever written (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn hydrate(conn: &mut SqliteConnection, row: ReceiptRow) -> DbResult<Receipt> {
    let tenders = fetch_tenders(conn, &row.id).await?;
    Ok(row.into_receipt(tenders))
}

// =============================================================================
// Connection-level Operations (run inside ledger transactions)
// =============================================================================

/// Loads the payment legs of a receipt in position order.
pub async fn fetch_tenders(conn: &mut SqliteConnection, receipt_id: &str) -> DbResult<Vec<Tender>> {
    let tenders = sqlx::query_as::<_, Tender>(
        r#"
        SELECT method, amount_cents, subtype
        FROM receipt_tenders
        WHERE receipt_id = ?
        ORDER BY position
        "#,
    )
    .bind(receipt_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(tenders)
}

/// Loads a receipt by checkout request id on the given connection.
pub async fn fetch_by_checkout_request(
    conn: &mut SqliteConnection,
    checkout_request_id: &str,
) -> DbResult<Option<Receipt>> {
    let row = sqlx::query_as::<_, ReceiptRow>(&format!(
        "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE checkout_request_id = ?"
    ))
    .bind(checkout_request_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(hydrate(conn, row).await?)),
        None => Ok(None),
    }
}

/// Inserts the receipt row and one tender row per payment leg.
pub async fn insert_receipt(conn: &mut SqliteConnection, receipt: &Receipt) -> DbResult<()> {
    debug!(
        id = %receipt.id,
        receipt_number = %receipt.receipt_number,
        "Inserting receipt"
    );

    sqlx::query(
        r#"
        INSERT INTO receipts (
            id, receipt_number, created_at, shift_id, staff_id, customer_id,
            total_cents, payment_kind, payment_subtype, payment_status,
            reference_code, checkout_request_id, is_return, origin_station
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&receipt.id)
    .bind(&receipt.receipt_number)
    .bind(receipt.created_at)
    .bind(&receipt.shift_id)
    .bind(&receipt.staff_id)
    .bind(&receipt.customer_id)
    .bind(receipt.total_cents)
    .bind(receipt.payment.kind())
    .bind(receipt.payment.subtype())
    .bind(receipt.payment_status)
    .bind(&receipt.reference_code)
    .bind(&receipt.checkout_request_id)
    .bind(receipt.is_return)
    .bind(&receipt.origin_station)
    .execute(&mut *conn)
    .await?;

    for (position, tender) in receipt.payment.tenders(receipt.total_cents).iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO receipt_tenders (id, receipt_id, position, method, amount_cents, subtype)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&receipt.id)
        .bind(position as i64)
        .bind(tender.method)
        .bind(tender.amount_cents)
        .bind(&tender.subtype)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Inserts one sale item row.
pub async fn insert_sale_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, receipt_id, product_id, staff_id, name_snapshot, quantity,
            unit_price_cents, is_return, return_reason, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.receipt_id)
    .bind(&item.product_id)
    .bind(&item.staff_id)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.is_return)
    .bind(&item.return_reason)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Settles a PENDING payment.
///
/// Guarded on the current status, so a callback that arrives twice (or late,
/// after the payment already settled) changes nothing. Returns true if the
/// row moved.
pub async fn settle_payment(
    conn: &mut SqliteConnection,
    checkout_request_id: &str,
    status: PaymentStatus,
    reference_code: Option<&str>,
) -> DbResult<bool> {
    debug!(checkout_request_id = %checkout_request_id, %status, "Settling payment");

    let result = sqlx::query(
        r#"
        UPDATE receipts
        SET payment_status = ?,
            reference_code = COALESCE(?, reference_code)
        WHERE checkout_request_id = ?
          AND payment_status = ?
        "#,
    )
    .bind(status)
    .bind(reference_code)
    .bind(checkout_request_id)
    .bind(PaymentStatus::Pending)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

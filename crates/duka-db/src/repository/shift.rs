//! # Shift Repository
//!
//! Shift rows and the tender lines a Z-report is computed from.
//!
//! ## Shift Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shift Lifecycle                                   │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── insert_open_shift() → closed_at NULL                           │
//! │         (partial UNIQUE index: one open shift per staff member)        │
//! │                                                                         │
//! │  2. SELL                                                               │
//! │     └── receipts.shift_id = shift.id                                   │
//! │                                                                         │
//! │  3. CLOSE (terminal)                                                   │
//! │     └── mark_closed()   → closed_at stamped, only if still NULL        │
//! │     └── record_close()  → closing_actual / closing_expected            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use duka_core::ledger::TenderLine;
use duka_core::Shift;

const SHIFT_COLUMNS: &str = r#"
    id, staff_id, opened_at, opening_float_cents,
    closed_at, closing_actual_cents, closing_expected_cents
"#;

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;
        fetch_shift(&mut conn, id).await
    }

    /// Gets the open shift for a staff member, if any.
    pub async fn get_open_for_staff(&self, staff_id: &str) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;
        fetch_open_shift(&mut conn, staff_id).await
    }

    /// Recent shifts for a staff member, newest first.
    pub async fn list_for_staff(&self, staff_id: &str, limit: u32) -> DbResult<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE staff_id = ? ORDER BY opened_at DESC LIMIT ?"
        ))
        .bind(staff_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }
}

// =============================================================================
// Connection-level Operations (run inside ledger transactions)
// =============================================================================

/// Loads a shift on the given connection.
pub async fn fetch_shift(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Shift>> {
    let shift = sqlx::query_as::<_, Shift>(&format!(
        "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(shift)
}

/// Loads the open shift for a staff member on the given connection.
pub async fn fetch_open_shift(
    conn: &mut SqliteConnection,
    staff_id: &str,
) -> DbResult<Option<Shift>> {
    let shift = sqlx::query_as::<_, Shift>(&format!(
        "SELECT {SHIFT_COLUMNS} FROM shifts WHERE staff_id = ? AND closed_at IS NULL"
    ))
    .bind(staff_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(shift)
}

/// Inserts an open shift unless the staff member already has one.
///
/// Returns true if a row was created. The partial unique index turns the
/// second insert into a no-op, so two racing opens still leave one row.
pub async fn insert_open_shift(conn: &mut SqliteConnection, shift: &Shift) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO shifts (id, staff_id, opened_at, opening_float_cents)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&shift.id)
    .bind(&shift.staff_id)
    .bind(shift.opened_at)
    .bind(shift.opening_float_cents)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Stamps `closed_at` if the shift is still open.
///
/// Returns false if the shift is missing or already closed. This is the
/// only statement that moves a shift out of OPEN.
pub async fn mark_closed(
    conn: &mut SqliteConnection,
    id: &str,
    closed_at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE shifts SET closed_at = ? WHERE id = ? AND closed_at IS NULL")
        .bind(closed_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Persists the counted and computed cash for a shift being closed.
pub async fn record_close(
    conn: &mut SqliteConnection,
    id: &str,
    closing_actual_cents: i64,
    closing_expected_cents: i64,
) -> DbResult<()> {
    debug!(id = %id, closing_actual_cents, closing_expected_cents, "Recording shift close");

    sqlx::query(
        r#"
        UPDATE shifts
        SET closing_actual_cents = ?,
            closing_expected_cents = ?
        WHERE id = ?
        "#,
    )
    .bind(closing_actual_cents)
    .bind(closing_expected_cents)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Every tender leg of every receipt tied to a shift, grouped by receipt.
///
/// Includes receipts in any payment status.
pub async fn tender_lines(conn: &mut SqliteConnection, shift_id: &str) -> DbResult<Vec<TenderLine>> {
    let lines = sqlx::query_as::<_, TenderLine>(
        r#"
        SELECT
            t.receipt_id,
            t.method,
            t.amount_cents,
            r.is_return
        FROM receipt_tenders t
        INNER JOIN receipts r ON r.id = t.receipt_id
        WHERE r.shift_id = ?
        ORDER BY t.receipt_id, t.position
        "#,
    )
    .bind(shift_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

//! # Sequence Repository
//!
//! One counter row per station in `invoice_sequences`.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    ensure_counter("POS-01")   INSERT OR IGNORE ... (station, 0)        │
//! │        └── first write: this transaction now holds the write lock      │
//! │    ...                                                                  │
//! │    allocate("POS-01")         UPDATE ... last_number + 1 RETURNING     │
//! │        └── 42 → "POS-01-00042"                                          │
//! │  COMMIT  (or ROLLBACK: the increment is discarded with everything else) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite admits one writer at a time, so two tills can never read the same
//! `last_number`. There is no in-process counter cache.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Read access to the station counters.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    /// Creates a new SequenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// The last number handed out for a station, 0 if none yet.
    pub async fn last_number(&self, station: &str) -> DbResult<i64> {
        let last: Option<i64> =
            sqlx::query_scalar("SELECT last_number FROM invoice_sequences WHERE station = ?")
                .bind(station)
                .fetch_optional(&self.pool)
                .await?;

        Ok(last.unwrap_or(0))
    }
}

// =============================================================================
// Connection-level Operations (run inside ledger transactions)
// =============================================================================

/// Lazily creates the counter row for a station, starting at 0.
pub async fn ensure_counter(conn: &mut SqliteConnection, station: &str) -> DbResult<()> {
    sqlx::query("INSERT OR IGNORE INTO invoice_sequences (station, last_number) VALUES (?, 0)")
        .bind(station)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Increments the station counter and returns the new value.
///
/// Call [`ensure_counter`] earlier in the same transaction.
pub async fn allocate(conn: &mut SqliteConnection, station: &str) -> DbResult<i64> {
    let next: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE invoice_sequences
        SET last_number = last_number + 1
        WHERE station = ?
        RETURNING last_number
        "#,
    )
    .bind(station)
    .fetch_optional(&mut *conn)
    .await?;

    let next = next.ok_or_else(|| DbError::not_found("Invoice sequence", station))?;

    debug!(station = %station, number = next, "Allocated sequence number");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_counter_starts_at_one() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.sequences().last_number("POS-01").await.unwrap(), 0);

        let mut tx = db.pool().begin().await.unwrap();
        ensure_counter(&mut tx, "POS-01").await.unwrap();
        assert_eq!(allocate(&mut tx, "POS-01").await.unwrap(), 1);
        assert_eq!(allocate(&mut tx, "POS-01").await.unwrap(), 2);
        tx.commit().await.unwrap();

        assert_eq!(db.sequences().last_number("POS-01").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rollback_discards_increment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        ensure_counter(&mut tx, "POS-02").await.unwrap();
        allocate(&mut tx, "POS-02").await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(db.sequences().last_number("POS-02").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_allocate_without_counter_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = allocate(&mut conn, "NOPE").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}

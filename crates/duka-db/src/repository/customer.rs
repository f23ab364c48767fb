//! # Customer Repository
//!
//! Customers and the credit ledger.
//!
//! `current_balance_cents` is what the customer owes the shop. It moves in
//! exactly two ways: the credit portion of a committed receipt, and a
//! repayment. Both go through this module.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use duka_core::Customer;

const CUSTOMER_COLUMNS: &str = r#"
    id, name, phone, email, kra_pin,
    current_balance_cents, debt_limit_cents,
    created_at, updated_at
"#;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    /// Creates a customer with a zero balance.
    pub async fn create(
        &self,
        name: &str,
        phone: Option<&str>,
        debt_limit_cents: i64,
    ) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.map(str::to_string),
            email: None,
            kra_pin: None,
            current_balance_cents: 0,
            debt_limit_cents,
            created_at: now,
            updated_at: now,
        };

        self.insert(&customer).await?;
        Ok(customer)
    }

    /// Inserts a customer as given, balance included.
    ///
    /// Used by imports and the seed binary; sales never create customers.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, email, kra_pin,
                current_balance_cents, debt_limit_cents,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.kra_pin)
        .bind(customer.current_balance_cents)
        .bind(customer.debt_limit_cents)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Changes a customer's debt limit.
    ///
    /// Lowering the limit below the current balance is allowed: it blocks
    /// further credit without touching what is already owed.
    pub async fn set_debt_limit(&self, id: &str, debt_limit_cents: i64) -> DbResult<()> {
        debug!(id = %id, debt_limit_cents, "Updating debt limit");

        let result =
            sqlx::query("UPDATE customers SET debt_limit_cents = ?, updated_at = ? WHERE id = ?")
                .bind(debt_limit_cents)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Customers who currently owe money, largest balance first.
    pub async fn debtors(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE current_balance_cents > 0 \
             ORDER BY current_balance_cents DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}

// =============================================================================
// Connection-level Operations (run inside ledger transactions)
// =============================================================================

/// Loads a customer on the given connection.
pub async fn fetch_customer(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(customer)
}

/// Applies a signed balance delta, refusing any increase past the limit.
///
/// The limit is re-checked in the `WHERE` clause, so even a caller that
/// skipped the pre-check cannot push a balance over it.
///
/// ## Returns
/// * `Ok(Some(balance))` - applied, with the new balance
/// * `Ok(None)` - customer missing, or the increase would exceed the limit
pub async fn apply_balance_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta_cents: i64,
) -> DbResult<Option<i64>> {
    debug!(id = %id, delta_cents, "Updating customer balance");

    let balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE customers
        SET current_balance_cents = current_balance_cents + ?,
            updated_at = ?
        WHERE id = ?
          AND (? <= 0 OR current_balance_cents + ? <= debt_limit_cents)
        RETURNING current_balance_cents
        "#,
    )
    .bind(delta_cents)
    .bind(Utc::now())
    .bind(id)
    .bind(delta_cents)
    .bind(delta_cents)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(balance)
}

/// Overwrites the balance with an already-computed value.
pub async fn set_balance(conn: &mut SqliteConnection, id: &str, balance_cents: i64) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE customers SET current_balance_cents = ?, updated_at = ? WHERE id = ?",
    )
    .bind(balance_cents)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", id));
    }

    Ok(())
}

/// Bumps `updated_at` so the transaction holds the write lock before any
/// read. Returns false if the customer doesn't exist.
pub async fn touch(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE customers SET updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

//! # Product Repository
//!
//! Database operations for products and the inventory ledger.
//!
//! ## Key Operations
//! - Catalog lookups (by id, by barcode)
//! - Inventory deltas
//! - Low-stock / oversell alerts
//!
//! ## Stock Update Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: Absolute update (loses concurrent sales)                │
//! │     UPDATE products SET stock_quantity = 7 WHERE id = ?            │
//! │                                                                     │
//! │  ✅ CORRECT: Delta update                                          │
//! │     UPDATE products SET stock_quantity = stock_quantity - 3        │
//! │                                                                     │
//! │  Till A: sells 3 → stock - 3                                       │
//! │  Till B: sells 2 → stock - 2                                       │
//! │  Both land: -3 + -2 = -5 total                                     │
//! │                                                                     │
//! │  There is no floor. A result below zero is an oversell, reported   │
//! │  back to the caller instead of rejected.                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use duka_core::{Product, StockAlert};

const PRODUCT_COLUMNS: &str = r#"
    id, barcode, name,
    price_buying_cents, price_selling_cents,
    wholesale_price_cents, wholesale_threshold,
    tax_rate_bps, stock_quantity, min_stock_alert,
    is_active, created_at, updated_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_barcode("6161101600019").await?;
/// let alerts = repo.stock_alerts().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Gets a product by its scanned barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(barcode = %product.barcode, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, barcode, name,
                price_buying_cents, price_selling_cents,
                wholesale_price_cents, wholesale_threshold,
                tax_rate_bps, stock_quantity, min_stock_alert,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price_buying_cents)
        .bind(product.price_selling_cents)
        .bind(product.wholesale_price_cents)
        .bind(product.wholesale_threshold)
        .bind(product.tax_rate_bps)
        .bind(product.stock_quantity)
        .bind(product.min_stock_alert)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.barcode),
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Adjusts stock outside a sale (deliveries, stock-take corrections).
    ///
    /// Returns the new stock level.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        apply_stock_delta(&mut conn, id, delta).await
    }

    /// Products that are oversold or at/below their alert threshold.
    ///
    /// Oversold products come first, then ascending by stock.
    pub async fn stock_alerts(&self) -> DbResult<Vec<StockAlert>> {
        let alerts = sqlx::query_as::<_, StockAlert>(
            r#"
            SELECT
                id AS product_id,
                barcode,
                name,
                stock_quantity,
                min_stock_alert
            FROM products
            WHERE is_active = 1
              AND stock_quantity <= min_stock_alert
            ORDER BY stock_quantity ASC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = alerts.len(), "Stock alerts computed");
        Ok(alerts)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Connection-level Operations (run inside ledger transactions)
// =============================================================================

/// Loads a product on the given connection.
pub async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Applies a signed stock delta and returns the resulting stock level.
///
/// ## Returns
/// * `Err(DbError::NotFound)` - product doesn't exist
pub async fn apply_stock_delta(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<i64> {
    debug!(id = %id, delta, "Updating stock");

    let stock: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + ?,
            updated_at = ?
        WHERE id = ?
        RETURNING stock_quantity
        "#,
    )
    .bind(delta)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    stock.ok_or_else(|| DbError::not_found("Product", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn product(barcode: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            barcode: barcode.to_string(),
            name: format!("Item {barcode}"),
            price_buying_cents: 5_000,
            price_selling_cents: 8_000,
            wholesale_price_cents: None,
            wholesale_threshold: None,
            tax_rate_bps: 1600,
            stock_quantity: stock,
            min_stock_alert: 5,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let p = repo.insert(&product("6161101600019", 20)).await.unwrap();

        let by_id = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(by_id.barcode, "6161101600019");
        assert_eq!(by_id.tax_rate_bps, 1600);

        let by_barcode = repo.get_by_barcode("6161101600019").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, p.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("123", 1)).await.unwrap();
        let err = repo.insert(&product("123", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_stock_can_go_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = repo.insert(&product("999", 1)).await.unwrap();

        assert_eq!(repo.adjust_stock(&p.id, -3).await.unwrap(), -2);
        assert_eq!(repo.adjust_stock(&p.id, 10).await.unwrap(), 8);

        let err = repo.adjust_stock("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_stock_alerts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("plenty", 50)).await.unwrap();
        repo.insert(&product("low", 5)).await.unwrap();
        repo.insert(&product("oversold", -2)).await.unwrap();

        let alerts = repo.stock_alerts().await.unwrap();
        let barcodes: Vec<_> = alerts.iter().map(|a| a.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["oversold", "low"]);
        assert!(alerts[0].is_oversold());
        assert!(!alerts[1].is_oversold());
    }
}

//! # Seed Data Generator
//!
//! Populates a development database with staff, a product catalog and a
//! few credit customers.
//!
//! ## Usage
//! ```bash
//! # Use station.toml / DUKA_DB_PATH / platform data dir
//! cargo run -p duka-db --bin seed
//!
//! # Specify database path
//! cargo run -p duka-db --bin seed -- --db ./data/duka.db
//!
//! # More logging
//! RUST_LOG=debug cargo run -p duka-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Staff: `admin` (admin) and `cashier` (cashier)
//! - Products: everyday shop lines in several pack sizes, some with a
//!   wholesale price, some deliberately low on stock
//! - Customers: a handful of regulars with debt limits and open balances

use std::env;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use duka_core::{Customer, Product, StaffRole, DEFAULT_MIN_STOCK_ALERT, DEFAULT_VAT_BPS};
use duka_db::{Database, DukaConfig};

/// Product lines and their base price in cents.
const LINES: &[(&str, i64)] = &[
    ("Unga wa Ugali", 18_000),
    ("Sugar", 16_000),
    ("Cooking Oil", 32_000),
    ("Rice Pishori", 24_000),
    ("Milk Fresha", 6_000),
    ("Bread Supaloaf", 6_500),
    ("Royco Mchuzi Mix", 1_500),
    ("Kimbo", 45_000),
    ("Omo", 25_000),
    ("Geisha Soap", 5_000),
    ("Colgate", 12_000),
    ("Ketepa Tea", 8_000),
    ("Blue Band", 14_000),
    ("Salt", 3_000),
    ("Soda 500ml", 8_000),
];

/// Pack sizes: name suffix and price multiplier in percent.
const SIZES: &[(&str, i64)] = &[("Small", 50), ("Regular", 100), ("Family", 190)];

/// Regular customers: name, phone, debt limit, opening balance (cents).
const CUSTOMERS: &[(&str, &str, i64, i64)] = &[
    ("Mama Njeri", "0712000001", 500_000, 120_000),
    ("Baba Otieno", "0712000002", 200_000, 0),
    ("Wanjiru Kamau", "0712000003", 100_000, 95_000),
    ("Hotel Jirani", "0712000004", 2_000_000, 750_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,duka=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("DukaPOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: from station config)");
                println!("  -c, --config <PATH>  Station config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = DukaConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }

    let db = Database::new(config.db_config()?).await?;
    info!(station = %config.station_id(), "Connected and migrated");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();

    db.staff().create("admin", Some("Shop Owner"), StaffRole::Admin).await?;
    db.staff().create("cashier", Some("Till Operator"), StaffRole::Cashier).await?;
    info!("Created 2 staff members");

    let mut generated = 0usize;
    for (line_idx, (name, base_price)) in LINES.iter().enumerate() {
        for (size_idx, (size, pct)) in SIZES.iter().enumerate() {
            let seed = line_idx * SIZES.len() + size_idx;
            let product = generate_product(name, size, base_price * pct / 100, seed);

            if let Err(e) = db.products().insert(&product).await {
                warn!(barcode = %product.barcode, error = %e, "Failed to insert product");
                continue;
            }
            generated += 1;
        }
    }
    info!(generated, "Created products");

    for (name, phone, limit, balance) in CUSTOMERS {
        let now = Utc::now();
        db.customers()
            .insert(&Customer {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                phone: Some(phone.to_string()),
                email: None,
                kra_pin: None,
                current_balance_cents: *balance,
                debt_limit_cents: *limit,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    info!(count = CUSTOMERS.len(), "Created customers");

    let alerts = db.products().stock_alerts().await?;
    info!(
        elapsed = ?start.elapsed(),
        low_stock = alerts.len(),
        "Seed complete"
    );

    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product(name: &str, size: &str, price_cents: i64, seed: usize) -> Product {
    let now = Utc::now();

    // EAN-13 shaped, checksum not valid
    let barcode = format!("616{:010}", seed);

    // buying price 70-85% of selling
    let cost_pct = 70 + (seed % 16) as i64;

    // every third product sells cheaper by the dozen
    let (wholesale_price_cents, wholesale_threshold) = if seed % 3 == 0 {
        (Some(price_cents * 92 / 100), Some(12))
    } else {
        (None, None)
    };

    // a few lines start at or under the alert level
    let stock_quantity = if seed % 7 == 0 { 2 } else { 10 + (seed % 90) as i64 };

    // basic foodstuffs are zero-rated
    let tax_rate_bps = if seed % 4 == 0 { 0 } else { DEFAULT_VAT_BPS };

    Product {
        id: Uuid::new_v4().to_string(),
        barcode,
        name: format!("{} {}", name, size),
        price_buying_cents: price_cents * cost_pct / 100,
        price_selling_cents: price_cents,
        wholesale_price_cents,
        wholesale_threshold,
        tax_rate_bps,
        stock_quantity,
        min_stock_alert: DEFAULT_MIN_STOCK_ALERT,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

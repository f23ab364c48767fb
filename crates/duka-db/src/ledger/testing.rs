//! Shared setup for ledger tests.

use chrono::Utc;
use uuid::Uuid;

use duka_core::{Customer, Product, Staff, StaffRole};

use super::Ledger;
use crate::pool::{Database, DbConfig};

pub(crate) struct Fixture {
    pub db: Database,
    pub ledger: Ledger,
    pub staff: Staff,
}

impl Fixture {
    /// In-memory database with one active cashier.
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Self::with_database(db).await
    }

    pub async fn with_database(db: Database) -> Self {
        let staff = db
            .staff()
            .create(&format!("cashier-{}", Uuid::new_v4()), None, StaffRole::Cashier)
            .await
            .unwrap();
        let ledger = Ledger::new(db.clone(), "POS-01").unwrap();

        Fixture { db, ledger, staff }
    }

    pub async fn product(&self, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            barcode: Uuid::new_v4().simple().to_string(),
            name: "Unga 2kg".to_string(),
            price_buying_cents: price_cents / 2,
            price_selling_cents: price_cents,
            wholesale_price_cents: None,
            wholesale_threshold: None,
            tax_rate_bps: 1600,
            stock_quantity: stock,
            min_stock_alert: 5,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.db.products().insert(&product).await.unwrap()
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        self.db
            .products()
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    pub async fn customer_with_balance(&self, balance_cents: i64, limit_cents: i64) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: "Mama Mboga".to_string(),
            phone: None,
            email: None,
            kra_pin: Some("A012345678Z".to_string()),
            current_balance_cents: balance_cents,
            debt_limit_cents: limit_cents,
            created_at: now,
            updated_at: now,
        };
        self.db.customers().insert(&customer).await.unwrap();
        customer
    }

    pub async fn balance_of(&self, customer_id: &str) -> i64 {
        self.db
            .customers()
            .get_by_id(customer_id)
            .await
            .unwrap()
            .unwrap()
            .current_balance_cents
    }
}

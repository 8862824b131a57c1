//! Shared fixtures for the service and HTTP tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use samagri_api::services::{CatalogService, InventoryService, RetryPolicy, TransactionService};
use samagri_core::api::{TransactionItemRequest, TransactionRequest};
use samagri_core::clock::FixedClock;
use samagri_core::inventory::StockPolicy;
use samagri_core::{Inventory, Money, NewCustomer, NewProduct};
use samagri_db::{Gateway, MemoryStore};

pub fn opening_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

/// A till wired to an in-memory store with a pinned clock.
pub struct Till {
    pub store: MemoryStore,
    pub policy: StockPolicy,
    pub sales: TransactionService,
    pub stock: InventoryService,
    pub catalog: CatalogService,
}

impl Till {
    pub fn new(low_water: i64) -> Self {
        Till::with_store(MemoryStore::new(), low_water)
    }

    pub fn with_store(store: MemoryStore, low_water: i64) -> Self {
        let gateway: Arc<dyn Gateway> = Arc::new(store.clone());
        let clock = Arc::new(FixedClock(opening_time()));
        let policy = StockPolicy::new(low_water);
        let retry = RetryPolicy::default();

        Till {
            sales: TransactionService::new(gateway.clone(), policy, clock.clone(), retry),
            stock: InventoryService::new(gateway.clone(), policy, clock, retry),
            catalog: CatalogService::new(gateway),
            store,
            policy,
        }
    }

    /// Registers a product and puts `quantity` units on the shelf.
    pub async fn product(&self, sku: &str, price_cents: i64, quantity: i64) -> i64 {
        let product = self
            .catalog
            .create_product(&NewProduct {
                name: format!("Product {sku}"),
                description: None,
                price: Money::from_cents(price_cents),
                sku: sku.to_string(),
                category: Some("grocery".to_string()),
                image_url: None,
                location: None,
            })
            .await
            .unwrap();

        self.store
            .set_stock(product.id, quantity, self.policy.status_for(quantity))
            .unwrap();
        product.id
    }

    pub async fn customer(&self, email: &str) -> i64 {
        self.catalog
            .create_customer(&NewCustomer {
                first_name: "Sita".to_string(),
                last_name: "Gurung".to_string(),
                email: email.to_string(),
                phone: None,
                address: None,
                birth_date: None,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn inventory(&self, product_id: i64) -> Inventory {
        self.store
            .inventories()
            .find_by_product(product_id)
            .await
            .unwrap()
            .unwrap()
    }
}

/// `(product_id, quantity, client price in cents)` per line.
pub fn sale(customer_id: i64, lines: &[(i64, i64, i64)]) -> TransactionRequest {
    TransactionRequest {
        customer_id,
        items: lines
            .iter()
            .map(|&(product_id, quantity, cents)| TransactionItemRequest {
                product_id,
                quantity,
                price: Money::from_cents(cents),
            })
            .collect(),
    }
}

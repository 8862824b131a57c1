//! Sale and stock-adjustment behaviour against the in-memory store.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use samagri_api::services::inventory::adjust_in;
use samagri_api::services::TransactionService;
use samagri_core::api::{PageRequest, StockAdjustmentRequest, TransactionFilter};
use samagri_core::{CoreError, InventoryStatus, Money};
use samagri_db::{with_transaction, Gateway, MemoryStore, UnitOfWork};

use common::{opening_time, sale, Till};

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_happy_path_single_item() {
    let till = Till::new(2);
    let customer = till.customer("sita@example.com").await;
    let rice = till.product("RICE-1KG", 250, 5).await;

    let response = till
        .sales
        .create_sale(&sale(customer, &[(rice, 2, 250)]), 3)
        .await
        .unwrap();

    assert_eq!(response.total_amount.to_string(), "5.00");
    assert_eq!(response.customer_id, customer);
    assert_eq!(response.user_id, 3);
    assert_eq!(response.items.len(), 1);
    assert_eq!(response.items[0].line_total, Money::from_cents(500));

    let inventory = till.inventory(rice).await;
    assert_eq!(inventory.quantity, 3);
    assert_eq!(inventory.status, InventoryStatus::InStock);
    assert_eq!(inventory.last_stock_update, opening_time());
}

#[tokio::test]
async fn test_insufficient_stock_leaves_inventory_unchanged() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let rice = till.product("RICE-1KG", 250, 1).await;
    let before = till.inventory(rice).await;

    let err = till
        .sales
        .create_sale(&sale(customer, &[(rice, 2, 250)]), 3)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::InsufficientStock {
            product_id,
            available: 1,
            requested: 2,
        } if product_id == rice
    ));
    assert_eq!(till.inventory(rice).await, before);

    let ledger = till
        .sales
        .list(&TransactionFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ledger.total, 0);
}

#[tokio::test]
async fn test_server_price_wins_over_client_price() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let oil = till.product("OIL-1L", 300, 20).await;

    let response = till
        .sales
        .create_sale(&sale(customer, &[(oil, 1, 100)]), 3)
        .await
        .unwrap();

    assert_eq!(response.total_amount.to_string(), "3.00");
    assert_eq!(response.items[0].price, Money::from_cents(300));
}

#[tokio::test]
async fn test_duplicate_lines_debit_once_and_keep_request_order() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let dal = till.product("DAL-1KG", 180, 5).await;

    let response = till
        .sales
        .create_sale(&sale(customer, &[(dal, 1, 180), (dal, 2, 180)]), 3)
        .await
        .unwrap();

    assert_eq!(till.inventory(dal).await.quantity, 2);
    let quantities: Vec<i64> = response.items.iter().map(|i| i.quantity).collect();
    assert_eq!(quantities, vec![1, 2]);
    assert_eq!(response.total_amount, Money::from_cents(540));
}

#[tokio::test]
async fn test_sale_crossing_low_water_marks_low_stock() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let tea = till.product("TEA-500G", 450, 12).await;

    till.sales
        .create_sale(&sale(customer, &[(tea, 3, 450)]), 3)
        .await
        .unwrap();

    let inventory = till.inventory(tea).await;
    assert_eq!(inventory.quantity, 9);
    assert_eq!(inventory.status, InventoryStatus::LowStock);
}

#[tokio::test]
async fn test_selling_last_unit_marks_out_of_stock() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let salt = till.product("SALT-1KG", 40, 1).await;

    till.sales
        .create_sale(&sale(customer, &[(salt, 1, 40)]), 3)
        .await
        .unwrap();

    assert_eq!(
        till.inventory(salt).await.status,
        InventoryStatus::OutOfStock
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_baskets_one_wins() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let a = till.product("A-1", 100, 5).await;
    let b = till.product("B-1", 100, 5).await;

    let first = spawn_sale(till.sales.clone(), sale(customer, &[(a, 3, 100), (b, 3, 100)]));
    let second = spawn_sale(till.sales.clone(), sale(customer, &[(b, 3, 100), (a, 3, 100)]));

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let won = outcomes.iter().filter(|o| o.is_ok()).count();
    let short = outcomes
        .iter()
        .filter(|o| matches!(o, Err(CoreError::InsufficientStock { .. })))
        .count();

    assert_eq!((won, short), (1, 1));
    assert_eq!(till.inventory(a).await.quantity, 2);
    assert_eq!(till.inventory(b).await.quantity, 2);
}

// =============================================================================
// Failure Paths
// =============================================================================

#[tokio::test]
async fn test_failure_midway_rolls_back_earlier_lines() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let rice = till.product("RICE-1KG", 250, 10).await;
    let sugar = till.product("SUGAR-1KG", 120, 1).await;

    let err = till
        .sales
        .create_sale(&sale(customer, &[(rice, 4, 250), (sugar, 2, 120)]), 3)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "insufficient-stock");
    assert_eq!(till.inventory(rice).await.quantity, 10);
    assert_eq!(till.inventory(sugar).await.quantity, 1);
}

#[tokio::test]
async fn test_unknown_customer_and_deleted_product() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let rice = till.product("RICE-1KG", 250, 10).await;

    let err = till
        .sales
        .create_sale(&sale(999, &[(rice, 1, 250)]), 3)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::CustomerNotFound(999)));

    till.catalog.delete_product(rice).await.unwrap();
    let err = till
        .sales
        .create_sale(&sale(customer, &[(rice, 1, 250)]), 3)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ProductNotFound(id) if id == rice));
}

#[tokio::test]
async fn test_invalid_request_rejected_before_store() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let rice = till.product("RICE-1KG", 250, 10).await;

    for request in [
        sale(customer, &[]),
        sale(customer, &[(rice, 0, 250)]),
        sale(customer, &[(rice, 1, -1)]),
    ] {
        let err = till.sales.create_sale(&request, 3).await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
    assert_eq!(till.inventory(rice).await.quantity, 10);
}

#[tokio::test]
async fn test_held_row_exhausts_retries_as_unavailable() {
    let store = MemoryStore::with_lock_timeout(Duration::from_millis(20));
    let till = Till::with_store(store.clone(), 10);
    let customer = till.customer("sita@example.com").await;
    let rice = till.product("RICE-1KG", 250, 10).await;

    let mut holder = store.begin().await.unwrap();
    holder.find_inventory_for_update(rice).await.unwrap();

    let err = till
        .sales
        .create_sale(&sale(customer, &[(rice, 1, 250)]), 3)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unavailable");

    holder.rollback().await.unwrap();
    till.sales
        .create_sale(&sale(customer, &[(rice, 1, 250)]), 3)
        .await
        .unwrap();
    assert_eq!(till.inventory(rice).await.quantity, 9);
}

// =============================================================================
// Concurrency Properties
// =============================================================================

fn spawn_sale(
    sales: TransactionService,
    request: samagri_core::api::TransactionRequest,
) -> tokio::task::JoinHandle<Result<samagri_core::api::TransactionResponse, CoreError>> {
    tokio::spawn(async move { sales.create_sale(&request, 3).await })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_no_lost_updates() {
    const WORKERS: i64 = 16;

    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let noodles = till.product("NOODLE-1", 25, WORKERS).await;

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| spawn_sale(till.sales.clone(), sale(customer, &[(noodles, 1, 25)])))
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert!(ids.insert(response.id));
    }

    assert_eq!(ids.len() as i64, WORKERS);
    let inventory = till.inventory(noodles).await;
    assert_eq!(inventory.quantity, 0);
    assert_eq!(inventory.status, InventoryStatus::OutOfStock);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_overlapping_baskets_never_deadlock() {
    const WORKERS: usize = 16;

    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let mut products = Vec::new();
    for sku in ["P-1", "P-2", "P-3", "P-4"] {
        products.push(till.product(sku, 100, 100).await);
    }

    // Each worker takes three of the four products, in a rotated and
    // sometimes reversed order.
    let handles: Vec<_> = (0..WORKERS)
        .map(|w| {
            let mut basket: Vec<(i64, i64, i64)> = (0..3)
                .map(|k| (products[(w + k) % products.len()], 1, 100))
                .collect();
            if w % 2 == 1 {
                basket.reverse();
            }
            spawn_sale(till.sales.clone(), sale(customer, &basket))
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert!(outcome.is_ok(), "sale failed: {outcome:?}");
    }

    let mut sold = 0;
    for &product in &products {
        sold += 100 - till.inventory(product).await.quantity;
    }
    assert_eq!(sold, (WORKERS * 3) as i64);
}

#[tokio::test]
async fn test_committed_totals_match_items() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let rice = till.product("RICE-1KG", 250, 50).await;
    let oil = till.product("OIL-1L", 325, 50).await;

    for basket in [
        vec![(rice, 1, 0)],
        vec![(rice, 2, 250), (oil, 3, 325)],
        vec![(oil, 1, 999), (rice, 1, 1), (oil, 2, 325)],
    ] {
        till.sales
            .create_sale(&sale(customer, &basket), 3)
            .await
            .unwrap();
    }

    let ledger = till
        .store
        .transactions()
        .list(
            &TransactionFilter::default(),
            samagri_core::api::Paging { page: 1, page_size: 100 },
        )
        .await
        .unwrap();
    assert_eq!(ledger.total, 3);
    for tx in &ledger.items {
        assert_eq!(tx.items_total(), tx.total_amount);
    }
}

#[tokio::test]
async fn test_round_trip_get_matches_create() {
    let till = Till::new(10);
    let customer = till.customer("sita@example.com").await;
    let rice = till.product("RICE-1KG", 250, 10).await;
    let dal = till.product("DAL-1KG", 180, 10).await;

    let created = till
        .sales
        .create_sale(&sale(customer, &[(dal, 2, 180), (rice, 1, 250)]), 3)
        .await
        .unwrap();
    let fetched = till.sales.get(created.id).await.unwrap();

    assert_eq!(fetched, created);
    assert!(matches!(
        till.sales.get(created.id + 1).await,
        Err(CoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_listing_filters_by_customer() {
    let till = Till::new(10);
    let sita = till.customer("sita@example.com").await;
    let ram = till.customer("ram@example.com").await;
    let rice = till.product("RICE-1KG", 250, 10).await;

    for customer in [sita, ram, sita] {
        till.sales
            .create_sale(&sale(customer, &[(rice, 1, 250)]), 3)
            .await
            .unwrap();
    }

    let page = till
        .sales
        .list(
            &TransactionFilter {
                customer_id: Some(sita),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|t| t.customer_id == sita));
    assert!(page.items[0].id > page.items[1].id);
}

// =============================================================================
// Stock Adjustments
// =============================================================================

#[tokio::test]
async fn test_adjustment_updates_status_and_writes_audit() {
    let till = Till::new(10);
    let rice = till.product("RICE-1KG", 250, 0).await;

    let response = till
        .stock
        .adjust(
            rice,
            &StockAdjustmentRequest {
                delta: 25,
                reason: "Delivery from supplier".to_string(),
            },
            Some(1),
        )
        .await
        .unwrap();
    assert_eq!(response.quantity, 25);
    assert_eq!(response.status, InventoryStatus::InStock);
    assert_eq!(response.product_name, "Product RICE-1KG");

    let audit = till.store.adjustments().unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].delta, 25);
    assert_eq!(audit[0].quantity_after, 25);
    assert_eq!(audit[0].user_id, Some(1));
}

#[tokio::test]
async fn test_adjustment_cannot_go_negative() {
    let till = Till::new(10);
    let rice = till.product("RICE-1KG", 250, 3).await;

    let err = till
        .stock
        .adjust(
            rice,
            &StockAdjustmentRequest {
                delta: -4,
                reason: "Damaged".to_string(),
            },
            Some(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "insufficient-stock");
    assert_eq!(till.inventory(rice).await.quantity, 3);
    assert!(till.store.adjustments().unwrap().is_empty());
}

#[tokio::test]
async fn test_adjustment_rejects_zero_delta_and_blank_reason() {
    let till = Till::new(10);
    let rice = till.product("RICE-1KG", 250, 3).await;

    for (delta, reason) in [(0, "Count"), (5, "   ")] {
        let err = till
            .stock
            .adjust(
                rice,
                &StockAdjustmentRequest {
                    delta,
                    reason: reason.to_string(),
                },
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
}

#[tokio::test]
async fn test_adjustment_joins_outer_unit_of_work() {
    let till = Till::new(10);
    let rice = till.product("RICE-1KG", 250, 3).await;
    let policy = till.policy;

    let outcome: Result<(), CoreError> = with_transaction(&till.store, move |uow| {
        Box::pin(async move {
            adjust_in(uow, policy, rice, 7, "Recount", None, opening_time()).await?;
            Err(CoreError::internal("abort after adjustment"))
        })
    })
    .await;

    assert!(outcome.is_err());
    assert_eq!(till.inventory(rice).await.quantity, 3);
    assert!(till.store.adjustments().unwrap().is_empty());
}

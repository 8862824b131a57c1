//! # Transaction Service
//!
//! Records sales. The only writer of transactions and their items.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(request, actor_user_id)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalePlan::from_request ── invalid ──► validation (no unit of work)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─ retry on deadlock (10ms, 40ms, 160ms) ───────────────────────────┐  │
//! │  │  with_transaction                                                  │  │
//! │  │    find_customer                  ── customer-not-found           │  │
//! │  │    for line in lock_order (ascending product id, deduplicated):   │  │
//! │  │      find_product                 ── product-not-found            │  │
//! │  │      find_inventory_for_update    ── inventory-missing            │  │
//! │  │      debit                        ── insufficient-stock           │  │
//! │  │    price request lines with server prices                          │  │
//! │  │    insert transaction, items in request order                     │  │
//! │  │    update inventories (quantity, status, last_stock_update)       │  │
//! │  │  commit                                                            │  │
//! │  └────────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TransactionResponse                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use samagri_core::api::{Page, PageRequest, TransactionFilter, TransactionRequest, TransactionResponse};
use samagri_core::clock::Clock;
use samagri_core::inventory::StockPolicy;
use samagri_core::sale::SalePlan;
use samagri_core::validation::{validate_id, validate_page};
use samagri_core::{CoreError, CoreResult, Transaction};
use samagri_db::{
    with_transaction, Gateway, InventoryUpdate, NewTransaction, NewTransactionItem, UnitOfWork,
};

use super::retry::RetryPolicy;

#[derive(Clone)]
pub struct TransactionService {
    gateway: Arc<dyn Gateway>,
    policy: StockPolicy,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl TransactionService {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        policy: StockPolicy,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        TransactionService {
            gateway,
            policy,
            clock,
            retry,
        }
    }

    /// Atomically records a sale made by `actor_user_id`.
    pub async fn create_sale(
        &self,
        request: &TransactionRequest,
        actor_user_id: i64,
    ) -> CoreResult<TransactionResponse> {
        let plan = SalePlan::from_request(request)?;
        let planned = &plan;

        let outcome = self
            .retry
            .run("create_sale", move || {
                self.record_once(planned.clone(), actor_user_id)
            })
            .await;

        match outcome {
            Ok(tx) => {
                info!(
                    transaction_id = tx.id,
                    customer_id = tx.customer_id,
                    user_id = actor_user_id,
                    total = %tx.total_amount,
                    items = tx.items.len(),
                    "Sale recorded"
                );
                Ok(tx.into())
            }
            Err(err) => {
                debug!(
                    customer_id = plan.customer_id(),
                    kind = err.kind(),
                    error = %err,
                    "Sale rejected"
                );
                Err(err)
            }
        }
    }

    async fn record_once(&self, plan: SalePlan, actor_user_id: i64) -> CoreResult<Transaction> {
        let policy = self.policy;
        let clock = self.clock.clone();

        with_transaction(self.gateway.as_ref(), move |uow| {
            Box::pin(async move { record_sale(uow, &plan, actor_user_id, policy, clock.now()).await })
        })
        .await
    }

    pub async fn get(&self, id: i64) -> CoreResult<TransactionResponse> {
        validate_id("id", id)?;

        self.gateway
            .transactions()
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| CoreError::not_found("Transaction", id))
    }

    /// Newest first.
    pub async fn list(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> CoreResult<Page<TransactionResponse>> {
        let paging = validate_page(page)?;
        let page = self.gateway.transactions().list(filter, paging).await?;
        Ok(page.map(Into::into))
    }
}

/// The body of a sale, run inside an open unit of work.
///
/// Inventory rows are held in `plan.lock_order()`; items are written in
/// request order. Any error leaves the unit of work to be rolled back.
pub async fn record_sale(
    uow: &mut dyn UnitOfWork,
    plan: &SalePlan,
    actor_user_id: i64,
    policy: StockPolicy,
    now: DateTime<Utc>,
) -> CoreResult<Transaction> {
    let customer_id = plan.customer_id();
    uow.find_customer(customer_id)
        .await?
        .ok_or(CoreError::CustomerNotFound(customer_id))?;

    let mut prices = HashMap::with_capacity(plan.lock_order().len());
    let mut updates = Vec::with_capacity(plan.lock_order().len());

    for line in plan.lock_order() {
        let product = uow
            .find_product(line.product_id)
            .await?
            .ok_or(CoreError::ProductNotFound(line.product_id))?;

        let inventory = uow
            .find_inventory_for_update(line.product_id)
            .await?
            .ok_or(CoreError::InventoryMissing(line.product_id))?;

        let remaining = policy.debit(line.product_id, inventory.quantity, line.quantity)?;

        prices.insert(line.product_id, product.price);
        updates.push(InventoryUpdate {
            product_id: line.product_id,
            quantity: remaining,
            status: policy.status_for(remaining),
            last_stock_update: now,
        });
    }

    let priced = plan.price(&prices)?;

    let mut tx = uow
        .insert_transaction(&NewTransaction {
            customer_id,
            user_id: actor_user_id,
            total_amount: priced.total,
            created_at: now,
        })
        .await?;

    for (index, line) in priced.lines.iter().enumerate() {
        let item = uow
            .insert_transaction_item(&NewTransactionItem {
                transaction_id: tx.id,
                line_no: index as i32 + 1,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
                created_at: now,
            })
            .await?;
        tx.items.push(item);
    }

    for update in &updates {
        uow.update_inventory(update).await?;
    }

    Ok(tx)
}

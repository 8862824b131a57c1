//! # Inventory Service
//!
//! Manual stock adjustments and stock lookups.
//!
//! Adjustments take the same exclusive hold on the inventory row as a
//! sale, so the two writers serialize per product. An adjustment never
//! leaves the quantity negative and always writes a `stock_adjustments`
//! audit row in the same unit of work.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use samagri_core::api::{InventoryFilter, InventoryResponse, Page, PageRequest, StockAdjustmentRequest};
use samagri_core::clock::Clock;
use samagri_core::inventory::StockPolicy;
use samagri_core::validation::{validate_adjustment, validate_id, validate_page};
use samagri_core::{CoreError, CoreResult, Inventory, Product};
use samagri_db::{with_transaction, Gateway, InventoryUpdate, NewStockAdjustment, UnitOfWork};

use super::retry::RetryPolicy;

#[derive(Clone)]
pub struct InventoryService {
    gateway: Arc<dyn Gateway>,
    policy: StockPolicy,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl InventoryService {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        policy: StockPolicy,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        InventoryService {
            gateway,
            policy,
            clock,
            retry,
        }
    }

    /// Adjusts stock in its own unit of work.
    pub async fn adjust(
        &self,
        product_id: i64,
        request: &StockAdjustmentRequest,
        actor_user_id: Option<i64>,
    ) -> CoreResult<InventoryResponse> {
        validate_id("product_id", product_id)?;
        validate_adjustment(request.delta, &request.reason)?;

        let (product, inventory) = self
            .retry
            .run("adjust_stock", move || {
                self.adjust_once(product_id, request, actor_user_id)
            })
            .await?;

        info!(
            product_id,
            delta = request.delta,
            quantity = inventory.quantity,
            status = %inventory.status,
            "Stock adjusted"
        );
        Ok(InventoryResponse::new(&product, inventory))
    }

    async fn adjust_once(
        &self,
        product_id: i64,
        request: &StockAdjustmentRequest,
        actor_user_id: Option<i64>,
    ) -> CoreResult<(Product, Inventory)> {
        let policy = self.policy;
        let now = self.clock.now();
        let delta = request.delta;
        let reason = request.reason.trim().to_string();

        with_transaction(self.gateway.as_ref(), move |uow| {
            Box::pin(async move {
                adjust_in(uow, policy, product_id, delta, &reason, actor_user_id, now).await
            })
        })
        .await
    }

    /// Stock for one live product.
    pub async fn get(&self, product_id: i64) -> CoreResult<InventoryResponse> {
        validate_id("product_id", product_id)?;

        let product = self
            .gateway
            .products()
            .find_by_id(product_id)
            .await?
            .ok_or(CoreError::ProductNotFound(product_id))?;

        let inventory = self
            .gateway
            .inventories()
            .find_by_product(product_id)
            .await?
            .ok_or(CoreError::InventoryMissing(product_id))?;

        Ok(InventoryResponse::new(&product, inventory))
    }

    pub async fn list(
        &self,
        filter: &InventoryFilter,
        page: PageRequest,
    ) -> CoreResult<Page<Inventory>> {
        let paging = validate_page(page)?;
        Ok(self.gateway.inventories().list(filter, paging).await?)
    }
}

/// Applies a stock adjustment inside an already-open unit of work.
///
/// Callers that are themselves running in a unit of work pass theirs in,
/// so the adjustment commits or rolls back with the rest of their writes.
pub async fn adjust_in(
    uow: &mut dyn UnitOfWork,
    policy: StockPolicy,
    product_id: i64,
    delta: i64,
    reason: &str,
    actor_user_id: Option<i64>,
    now: DateTime<Utc>,
) -> CoreResult<(Product, Inventory)> {
    let product = uow
        .find_product(product_id)
        .await?
        .ok_or(CoreError::ProductNotFound(product_id))?;

    let mut inventory = uow
        .find_inventory_for_update(product_id)
        .await?
        .ok_or(CoreError::InventoryMissing(product_id))?;

    let quantity = policy.apply_delta(product_id, inventory.quantity, delta)?;
    let status = policy.status_for(quantity);

    uow.update_inventory(&InventoryUpdate {
        product_id,
        quantity,
        status,
        last_stock_update: now,
    })
    .await?;

    uow.insert_stock_adjustment(&NewStockAdjustment {
        product_id,
        delta,
        quantity_after: quantity,
        reason: reason.to_string(),
        user_id: actor_user_id,
        created_at: now,
    })
    .await?;

    inventory.quantity = quantity;
    inventory.status = status;
    inventory.last_stock_update = now;
    inventory.updated_at = now;
    Ok((product, inventory))
}

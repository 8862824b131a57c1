//! Stock endpoints. Reads are open to every role, adjustments are not.

use axum::extract::State;
use serde::Deserialize;

use samagri_core::api::{
    InventoryFilter, InventoryResponse, Page, PageRequest, StockAdjustmentRequest,
};
use samagri_core::{Inventory, InventoryStatus};

use super::extract::{Json, Path, Query};
use crate::auth::Actor;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<InventoryStatus>,
}

/// `GET /inventory?status=low_stock`
pub async fn list(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<InventoryQuery>,
) -> ApiResult<Json<Page<Inventory>>> {
    let filter = InventoryFilter {
        status: query.status,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(state.inventory.list(&filter, page).await?))
}

/// `GET /inventory/{product_id}`
pub async fn get(
    State(state): State<AppState>,
    _actor: Actor,
    Path(product_id): Path<i64>,
) -> ApiResult<Json<InventoryResponse>> {
    Ok(Json(state.inventory.get(product_id).await?))
}

/// `POST /inventory/{product_id}/adjust`
pub async fn adjust(
    State(state): State<AppState>,
    actor: Actor,
    Path(product_id): Path<i64>,
    Json(request): Json<StockAdjustmentRequest>,
) -> ApiResult<Json<InventoryResponse>> {
    actor.require_manager()?;

    let inventory = state
        .inventory
        .adjust(product_id, &request, Some(actor.user_id))
        .await?;
    Ok(Json(inventory))
}

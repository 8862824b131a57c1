//! Sales endpoints. Any active role may record and read sales.

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use samagri_core::api::{
    Page, PageRequest, TransactionFilter, TransactionRequest, TransactionResponse,
};

use super::extract::{Json, Path, Query};
use crate::auth::Actor;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub customer_id: Option<i64>,
}

/// `POST /transactions`
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<TransactionRequest>,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    let sale = state
        .transactions
        .create_sale(&request, actor.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// `GET /transactions/{id}`
pub async fn get(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Json<TransactionResponse>> {
    Ok(Json(state.transactions.get(id).await?))
}

/// `GET /transactions?page=&page_size=&customer_id=`
pub async fn list(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Json<Page<TransactionResponse>>> {
    let filter = TransactionFilter {
        customer_id: query.customer_id,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(state.transactions.list(&filter, page).await?))
}

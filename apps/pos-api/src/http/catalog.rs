//! Products, customers and users.
//!
//! Reads are open to every role; writes need an admin or manager.

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use samagri_core::api::{CustomerFilter, Page, PageRequest, ProductFilter, UserFilter};
use samagri_core::{Customer, NewCustomer, NewProduct, Product, User, UserRole};

use super::extract::{Json, Path, Query};
use crate::auth::Actor;
use crate::error::ApiResult;
use crate::services::UserRegistration;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub role: Option<UserRole>,
}

// =============================================================================
// Products
// =============================================================================

pub async fn create_product(
    State(state): State<AppState>,
    actor: Actor,
    Json(product): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    actor.require_manager()?;
    let product = state.catalog.create_product(&product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.catalog.get_product(id).await?))
}

pub async fn list_products(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Page<Product>>> {
    let filter = ProductFilter {
        category: query.category,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(state.catalog.list_products(&filter, page).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    actor.require_manager()?;
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Customers
// =============================================================================

pub async fn create_customer(
    State(state): State<AppState>,
    actor: Actor,
    Json(customer): Json<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    actor.require_manager()?;
    let customer = state.catalog.create_customer(&customer).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.catalog.get_customer(id).await?))
}

pub async fn list_customers(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Json<Page<Customer>>> {
    let filter = CustomerFilter { email: query.email };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(state.catalog.list_customers(&filter, page).await?))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    actor.require_manager()?;
    state.catalog.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Users
// =============================================================================

pub async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    Json(registration): Json<UserRegistration>,
) -> ApiResult<(StatusCode, Json<User>)> {
    actor.require_manager()?;
    let user = state.catalog.create_user(&registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Page<User>>> {
    actor.require_manager()?;
    let filter = UserFilter { role: query.role };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(state.catalog.list_users(&filter, page).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    actor.require_manager()?;
    state.catalog.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! # HTTP Adapter
//!
//! axum routes over the services. Handlers decode, check the caller's role
//! and delegate; every failure leaves as an [`crate::error::ApiError`].
//!
//! ## Routes
//! ```text
//! GET    /health                          liveness            (public)
//! GET    /health/ready                    database reachable  (public)
//!
//! POST   /transactions                    record a sale       any role
//! GET    /transactions                    ?customer_id=       any role
//! GET    /transactions/{id}                                   any role
//!
//! POST   /products                                            admin, manager
//! GET    /products                        ?category=          any role
//! GET    /products/{id}                                       any role
//! DELETE /products/{id}                   soft delete         admin, manager
//!
//! POST   /customers                                           admin, manager
//! GET    /customers                       ?email=             any role
//! GET    /customers/{id}                                      any role
//! DELETE /customers/{id}                  soft delete         admin, manager
//!
//! GET    /inventory                       ?status=            any role
//! GET    /inventory/{product_id}                              any role
//! POST   /inventory/{product_id}/adjust   {delta, reason}     admin, manager
//!
//! POST   /users                                               admin, manager
//! GET    /users                           ?role=              admin, manager
//! DELETE /users/{id}                      deactivate          admin, manager
//! ```
//! Every listing also takes `page` and `page_size`.

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod catalog;
pub mod extract;
pub mod health;
pub mod inventory;
pub mod middleware;
pub mod transactions;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::live))
        .route("/health/ready", get(health::ready))
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route("/transactions/{id}", get(transactions::get))
        .route(
            "/products",
            post(catalog::create_product).get(catalog::list_products),
        )
        .route(
            "/products/{id}",
            get(catalog::get_product).delete(catalog::delete_product),
        )
        .route(
            "/customers",
            post(catalog::create_customer).get(catalog::list_customers),
        )
        .route(
            "/customers/{id}",
            get(catalog::get_customer).delete(catalog::delete_customer),
        )
        .route("/inventory", get(inventory::list))
        .route("/inventory/{product_id}", get(inventory::get))
        .route("/inventory/{product_id}/adjust", post(inventory::adjust))
        .route("/users", post(catalog::create_user).get(catalog::list_users))
        .route("/users/{id}", axum::routing::delete(catalog::delete_user))
        .layer(from_fn(middleware::request_tracing))
        .with_state(state)
}

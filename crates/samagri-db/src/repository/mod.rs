//! # Repository Module
//!
//! One repository contract per aggregate, with concrete entity types.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Service                                                                │
//! │       │  gateway.products().find_by_id(1)                               │
//! │       ▼                                                                 │
//! │  dyn ProductRepository                                                  │
//! │  ├── create(&NewProduct)                                                │
//! │  ├── find_by_id(id)          → Option (live rows only)                  │
//! │  ├── list(filter, paging)    → Page                                     │
//! │  └── soft_delete(id)                                                    │
//! │       │                                                                 │
//! │       ├──► PgProductRepository   (PostgreSQL)                           │
//! │       └──► MemoryStore           (in-process)                           │
//! │                                                                         │
//! │  Writes that must be atomic with stock changes do NOT go through        │
//! │  these traits; they go through a [`crate::UnitOfWork`].                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use samagri_core::api::{
    CustomerFilter, InventoryFilter, Page, Paging, ProductFilter, TransactionFilter, UserFilter,
};
use samagri_core::{
    Customer, Inventory, NewCustomer, NewProduct, NewUser, Product, Transaction, User,
};

use crate::error::DbResult;

pub mod customer;
pub mod inventory;
pub mod product;
pub mod transaction;
pub mod user;

pub use customer::PgCustomerRepository;
pub use inventory::PgInventoryRepository;
pub use product::PgProductRepository;
pub use transaction::PgTransactionRepository;
pub use user::PgUserRepository;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts the product and its inventory row (quantity 0,
    /// `out_of_stock`) atomically.
    async fn create(&self, product: &NewProduct) -> DbResult<Product>;

    async fn find_by_id(&self, id: i64) -> DbResult<Option<Product>>;

    async fn list(&self, filter: &ProductFilter, paging: Paging) -> DbResult<Page<Product>>;

    /// Marks the product deleted. `NotFound` if it is not live.
    async fn soft_delete(&self, id: i64) -> DbResult<()>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<Inventory>>;

    async fn find_by_product(&self, product_id: i64) -> DbResult<Option<Inventory>>;

    async fn list(&self, filter: &InventoryFilter, paging: Paging) -> DbResult<Page<Inventory>>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: &NewCustomer) -> DbResult<Customer>;

    async fn find_by_id(&self, id: i64) -> DbResult<Option<Customer>>;

    async fn list(&self, filter: &CustomerFilter, paging: Paging) -> DbResult<Page<Customer>>;

    async fn soft_delete(&self, id: i64) -> DbResult<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> DbResult<User>;

    async fn find_by_id(&self, id: i64) -> DbResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>>;

    async fn list(&self, filter: &UserFilter, paging: Paging) -> DbResult<Page<User>>;

    /// Marks the user deleted; their tokens stop authenticating.
    async fn soft_delete(&self, id: i64) -> DbResult<()>;
}

/// Read side of the sales ledger. Sales are written only through a
/// unit of work.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// The transaction with its items in request order.
    async fn find_by_id(&self, id: i64) -> DbResult<Option<Transaction>>;

    /// Newest first.
    async fn list(
        &self,
        filter: &TransactionFilter,
        paging: Paging,
    ) -> DbResult<Page<Transaction>>;
}

//! # Persistence Gateway
//!
//! The only door to the store. Services hold an `Arc<dyn Gateway>` and
//! never see which backend is behind it.
//!
//! ```text
//!                  ┌──────────────────────┐
//!   services ────► │    dyn Gateway       │
//!                  │  products()          │
//!                  │  inventories()       │
//!                  │  customers()         │
//!                  │  users()             │
//!                  │  transactions()      │
//!                  │  begin() → UoW       │
//!                  └──────┬────────┬──────┘
//!                         │        │
//!                  Database    MemoryStore
//!                 (PgPool)    (in-process)
//! ```

use async_trait::async_trait;

use crate::error::DbResult;
use crate::repository::{
    CustomerRepository, InventoryRepository, ProductRepository, TransactionRepository,
    UserRepository,
};
use crate::uow::UnitOfWork;

#[async_trait]
pub trait Gateway: Send + Sync {
    fn products(&self) -> &dyn ProductRepository;

    fn inventories(&self) -> &dyn InventoryRepository;

    fn customers(&self) -> &dyn CustomerRepository;

    fn users(&self) -> &dyn UserRepository;

    fn transactions(&self) -> &dyn TransactionRepository;

    /// Opens a unit of work. Borrows one connection until it ends.
    async fn begin(&self) -> DbResult<Box<dyn UnitOfWork>>;

    /// Whether the store answers a trivial query.
    async fn health_check(&self) -> bool;
}

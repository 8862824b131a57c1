//! # samagri-db: Persistence Gateway for the Apana Samagri POS
//!
//! This crate provides every read and write the POS makes against its
//! relational store. PostgreSQL is the production backend; an in-memory
//! store with the same contract backs tests and demos.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Apana Samagri Data Flow                             │
//! │                                                                         │
//! │  POST /transactions                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TransactionService (pos-api)                                           │
//! │       │  with_transaction(gateway, |uow| record_sale(uow, plan))        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  samagri-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Gateway     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (gateway.rs)  │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Database      │    │ products      │    │ 0001_initial │  │   │
//! │  │   │ MemoryStore   │◄───│ inventories   │    │   _schema    │  │   │
//! │  │   │ UnitOfWork    │    │ customers ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     PostgreSQL                                  │   │
//! │  │   READ COMMITTED, SELECT ... FOR UPDATE on inventories          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`gateway`] - The `Gateway` trait services depend on
//! - [`uow`] - Unit of work, write models, `with_transaction`
//! - [`pool`] - PostgreSQL pool and the `Database` gateway
//! - [`memory`] - In-process gateway
//! - [`repository`] - Read/write repositories per aggregate
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use samagri_db::{Database, DbConfig, Gateway};
//!
//! let db = Database::new(DbConfig::new("localhost", 5432, "postgres", "postgres", "pos_db")).await?;
//! let product = db.products().find_by_id(1).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gateway;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod uow;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use gateway::Gateway;
pub use memory::MemoryStore;
pub use pool::{Database, DbConfig};
pub use uow::{
    with_transaction, InventoryUpdate, NewStockAdjustment, NewTransaction, NewTransactionItem,
    UnitOfWork,
};

// Repository re-exports for convenience
pub use repository::{
    CustomerRepository, InventoryRepository, ProductRepository, TransactionRepository,
    UserRepository,
};

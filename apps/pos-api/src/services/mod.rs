//! Application services.
//!
//! Each service owns one slice of the business and talks to the store
//! only through the [`samagri_db::Gateway`] it was built with.

pub mod catalog;
pub mod inventory;
pub mod retry;
pub mod transaction;

pub use catalog::{CatalogService, UserRegistration};
pub use inventory::InventoryService;
pub use retry::RetryPolicy;
pub use transaction::TransactionService;

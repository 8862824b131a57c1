//! # samagri-core: Pure Business Logic for the Apana Samagri POS
//!
//! This crate holds the domain model and every rule that does not need I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Apana Samagri Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pos-api (axum)                               │   │
//! │  │    routes ──► services (transaction, inventory, catalog)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ samagri-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │ inventory │  │   │
//! │  │   │  Product  │  │   Money   │  │ SalePlan  │  │StockPolicy│  │   │
//! │  │   │Transaction│  │  "5.00"   │  │ lock order│  │  status   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    samagri-db (Persistence Gateway)             │   │
//! │  │        PostgreSQL repositories, unit of work, migrations       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Product, Inventory, Customer, User, Transaction)
//! - [`money`] - Money type with integer arithmetic
//! - [`api`] - Request/response DTOs and paging
//! - [`sale`] - Sale planning: deduplication, lock order, pricing
//! - [`inventory`] - Stock status policy
//! - [`validation`] - Input validation
//! - [`clock`] - Time source
//! - [`error`] - Domain error taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use samagri_core::inventory::StockPolicy;
//! use samagri_core::{InventoryStatus, Money};
//!
//! let price: Money = "2.50".parse().unwrap();
//! assert_eq!((price * 2).to_string(), "5.00");
//!
//! let policy = StockPolicy::new(10);
//! assert_eq!(policy.status_for(9), InventoryStatus::LowStock);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod clock;
pub mod error;
pub mod inventory;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page a listing returns; bigger requests are clamped.
pub const MAX_PAGE_SIZE: i64 = 100;

//! # Apana Samagri POS API
//!
//! HTTP server for the POS backend: cashiers record sales, managers keep
//! the catalog and stock in order.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          POS API Server                                 │
//! │                                                                         │
//! │  Till ───► HTTP (8080) ───► request span ───► Actor (Bearer JWT)        │
//! │                                                   │                     │
//! │                                                   ▼                     │
//! │               ┌────────────────────┬────────────────────┬────────────┐  │
//! │               │ TransactionService │  InventoryService  │  Catalog   │  │
//! │               │ create_sale        │  adjust / adjust_in│  products  │  │
//! │               │ deadlock retry     │                    │  customers │  │
//! │               └─────────┬──────────┴─────────┬──────────┴─────┬──────┘  │
//! │                         └────────────────────┼────────────────┘         │
//! │                                              ▼                          │
//! │                                   dyn Gateway (samagri-db)              │
//! │                                   PostgreSQL or in-memory               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (optionally from `.env`):
//! - `PORT` - HTTP port (default: 8080)
//! - `ENV` - `development`, `staging` or `production` (default: development)
//! - `DB_DRIVER` - `postgres` or `memory` (default: postgres)
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_SSLMODE`
//! - `DB_MAX_CONNECTIONS` - pool size (default: 20)
//! - `DB_STATEMENT_TIMEOUT_MS` - statement and lock-wait timeout (default: 5000)
//! - `JWT_SECRET` - HS256 secret, required outside development
//! - `JWT_TTL_SECS` - lifetime of seeded tokens (default: 3600)
//! - `INVENTORY_LOW_WATER` - low-stock threshold (default: 10)

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod services;
pub mod state;

// Re-exports
pub use config::{AppConfig, ConfigError, DbDriver, Environment};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use http::router;
pub use state::AppState;

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: pretty output in development, JSON
/// lines elsewhere. `RUST_LOG` overrides the default filter.
pub fn init_tracing(env: Environment) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let default_filter = if env.is_development() {
        "info,samagri_api=debug,samagri_db=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    if env.is_development() {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(true))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    }
}

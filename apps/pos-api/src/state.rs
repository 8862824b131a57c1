//! Shared application state handed to every handler.

use std::sync::Arc;

use samagri_core::clock::{Clock, SystemClock};
use samagri_core::inventory::StockPolicy;
use samagri_db::Gateway;

use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::services::{CatalogService, InventoryService, RetryPolicy, TransactionService};

/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtManager>,
    pub transactions: TransactionService,
    pub inventory: InventoryService,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(gateway: Arc<dyn Gateway>, config: AppConfig) -> Self {
        AppState::with_clock(gateway, config, Arc::new(SystemClock))
    }

    /// State whose services read time from `clock`.
    pub fn with_clock(gateway: Arc<dyn Gateway>, config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let policy = StockPolicy::new(config.inventory_low_water);
        let retry = RetryPolicy::default();

        AppState {
            jwt: Arc::new(JwtManager::new(&config.jwt_secret, config.jwt_ttl_secs)),
            transactions: TransactionService::new(gateway.clone(), policy, clock.clone(), retry),
            inventory: InventoryService::new(gateway.clone(), policy, clock, retry),
            catalog: CatalogService::new(gateway.clone()),
            config: Arc::new(config),
            gateway,
        }
    }
}

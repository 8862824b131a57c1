//! # Database Pool Management
//!
//! Connection pool creation and configuration for PostgreSQL.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Server Startup                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(host, port, ...) ← pool size, statement timeout          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                            │
//! │  │               PgPool                    │                            │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐        │  (max_connections = 20)    │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...    │                            │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘        │                            │
//! │  └─────────────────────────────────────────┘                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Each request borrows one connection for its unit of work and           │
//! │  returns it on commit/rollback.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Statement Timeout
//! Every connection runs with `statement_timeout` set. A sale waiting on a
//! locked inventory row longer than that fails with SQLSTATE 57014, which
//! is classified as a retryable deadlock.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::gateway::Gateway;
use crate::migrations;
use crate::repository::{
    CustomerRepository, InventoryRepository, PgCustomerRepository, PgInventoryRepository,
    PgProductRepository, PgTransactionRepository, PgUserRepository, ProductRepository,
    TransactionRepository, UserRepository,
};
use crate::uow::{PgUnitOfWork, UnitOfWork};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("localhost", 5432, "postgres", "postgres", "pos_db")
///     .max_connections(20)
///     .statement_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub ssl_mode: PgSslMode,

    /// Maximum number of connections in the pool.
    /// Default: 20
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a pooled connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Server-side statement timeout, applied to every connection.
    /// Default: 5 seconds
    pub statement_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        DbConfig {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            ssl_mode: PgSslMode::Disable,
            max_connections: 20,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            statement_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Parses a libpq-style `sslmode` (`disable`, `require`, ...).
    pub fn ssl_mode(mut self, mode: &str) -> DbResult<Self> {
        self.ssl_mode = PgSslMode::from_str(mode)
            .map_err(|e| DbError::ConnectionFailed(format!("invalid sslmode '{mode}': {e}")))?;
        Ok(self)
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Connection options, including the per-connection statement timeout.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(self.ssl_mode)
            .options([(
                "statement_timeout",
                format!("{}", self.statement_timeout.as_millis()),
            )])
    }
}

// =============================================================================
// Database
// =============================================================================

/// PostgreSQL-backed [`Gateway`].
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    products: PgProductRepository,
    inventories: PgInventoryRepository,
    customers: PgCustomerRepository,
    users: PgUserRepository,
    transactions: PgTransactionRepository,
}

impl Database {
    /// Creates the pool and, if enabled, runs migrations.
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError::ConnectionFailed)` - The server could not be reached
    /// * `Err(DbError::MigrationFailed)` - The schema could not be applied
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Initializing database connection"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            statement_timeout_ms = config.statement_timeout.as_millis() as u64,
            "Database pool created"
        );

        let db = Database::from_pool(pool);

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Wraps an existing pool. Does not run migrations.
    pub fn from_pool(pool: PgPool) -> Self {
        Database {
            products: PgProductRepository::new(pool.clone()),
            inventories: PgInventoryRepository::new(pool.clone()),
            customers: PgCustomerRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            transactions: PgTransactionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Closes the connection pool. Call on shutdown.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

#[async_trait]
impl Gateway for Database {
    fn products(&self) -> &dyn ProductRepository {
        &self.products
    }

    fn inventories(&self) -> &dyn InventoryRepository {
        &self.inventories
    }

    fn customers(&self) -> &dyn CustomerRepository {
        &self.customers
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn transactions(&self) -> &dyn TransactionRepository {
        &self.transactions
    }

    async fn begin(&self) -> DbResult<Box<dyn UnitOfWork>> {
        debug!("Beginning unit of work");
        let uow = PgUnitOfWork::begin(&self.pool).await?;
        Ok(Box::new(uow))
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DbConfig::new("localhost", 5432, "postgres", "postgres", "pos_db");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.statement_timeout, Duration::from_secs(5));
        assert!(matches!(config.ssl_mode, PgSslMode::Disable));
        assert!(config.run_migrations);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("db", 5433, "pos", "secret", "pos_test")
            .max_connections(4)
            .statement_timeout(Duration::from_millis(250))
            .ssl_mode("require")
            .unwrap();

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.statement_timeout, Duration::from_millis(250));
        assert!(matches!(config.ssl_mode, PgSslMode::Require));
    }

    #[test]
    fn test_invalid_ssl_mode() {
        let result = DbConfig::new("db", 5432, "u", "p", "d").ssl_mode("sometimes");
        assert!(matches!(result, Err(DbError::ConnectionFailed(_))));
    }
}

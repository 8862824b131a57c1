//! POS API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. An optional `.env` file in the working directory is read
//! first; variables already set in the process environment win.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use samagri_core::inventory::DEFAULT_LOW_WATER;
use samagri_db::DbConfig;

/// Secret used when `ENV=development` and `JWT_SECRET` is unset.
const DEV_JWT_SECRET: &str = "samagri-dev-secret-change-in-production";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        })
    }
}

/// Which gateway backs the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    Postgres,
    Memory,
}

impl FromStr for DbDriver {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(DbDriver::Postgres),
            "memory" => Ok(DbDriver::Memory),
            _ => Err(()),
        }
    }
}

/// POS API configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// HTTP listen port
    pub port: u16,

    pub env: Environment,

    pub db_driver: DbDriver,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_sslmode: String,

    /// Pool size (default: 20)
    pub db_max_connections: u32,

    /// Per-statement timeout; also bounds inventory lock waits (default: 5000)
    pub db_statement_timeout_ms: u64,

    /// HS256 secret for bearer tokens
    pub jwt_secret: String,

    /// Lifetime of tokens minted by the seed tool (default: 3600)
    pub jwt_ttl_secs: i64,

    /// Inventory at or below this is `low_stock` (default: 10)
    pub inventory_low_water: i64,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("env", &self.env)
            .field("db_driver", &self.db_driver)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_name", &self.db_name)
            .field("db_sslmode", &self.db_sslmode)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_statement_timeout_ms", &self.db_statement_timeout_ms)
            .field("jwt_ttl_secs", &self.jwt_ttl_secs)
            .field("inventory_low_water", &self.inventory_low_water)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load configuration from `.env` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();
        AppConfig::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let env: Environment = parse(&lookup, "ENV", "development")?;

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if env.is_development() => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::MissingRequired("JWT_SECRET".to_string())),
        };

        let config = AppConfig {
            port: parse(&lookup, "PORT", "8080")?,
            env,
            db_driver: parse(&lookup, "DB_DRIVER", "postgres")?,
            db_host: var("DB_HOST", "localhost"),
            db_port: parse(&lookup, "DB_PORT", "5432")?,
            db_user: var("DB_USER", "postgres"),
            db_password: var("DB_PASSWORD", "postgres"),
            db_name: var("DB_NAME", "pos_db"),
            db_sslmode: var("DB_SSLMODE", "disable"),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", "20")?,
            db_statement_timeout_ms: parse(&lookup, "DB_STATEMENT_TIMEOUT_MS", "5000")?,
            jwt_secret,
            jwt_ttl_secs: parse(&lookup, "JWT_TTL_SECS", "3600")?,
            inventory_low_water: parse(&lookup, "INVENTORY_LOW_WATER", &DEFAULT_LOW_WATER.to_string())?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.inventory_low_water < 0 {
            return Err(ConfigError::InvalidValue("INVENTORY_LOW_WATER".to_string()));
        }
        if config.jwt_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_TTL_SECS".to_string()));
        }

        Ok(config)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.db_statement_timeout_ms)
    }

    /// PostgreSQL settings for [`samagri_db::Database::new`].
    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        DbConfig::new(
            &self.db_host,
            self.db_port,
            &self.db_user,
            &self.db_password,
            &self.db_name,
        )
        .max_connections(self.db_max_connections)
        .statement_timeout(self.statement_timeout())
        .ssl_mode(&self.db_sslmode)
        .map_err(|_| ConfigError::InvalidValue("DB_SSLMODE".to_string()))
    }
}

fn parse<T, F>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.db_driver, DbDriver::Postgres);
        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.db_name, "pos_db");
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.statement_timeout(), Duration::from_secs(5));
        assert_eq!(config.inventory_low_water, 10);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn test_jwt_secret_required_outside_development() {
        let result = AppConfig::from_lookup(lookup(&[("ENV", "production")]));
        assert!(matches!(result, Err(ConfigError::MissingRequired(ref v)) if v == "JWT_SECRET"));

        let config =
            AppConfig::from_lookup(lookup(&[("ENV", "production"), ("JWT_SECRET", "s3cret")]))
                .unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("PORT", "http"),
            ("ENV", "qa"),
            ("DB_DRIVER", "sqlite"),
            ("INVENTORY_LOW_WATER", "-1"),
            ("DB_MAX_CONNECTIONS", "0"),
        ] {
            let result = AppConfig::from_lookup(lookup(&[(key, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(ref v)) if v == key),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_db_config_carries_pool_settings() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DB_MAX_CONNECTIONS", "8"),
            ("DB_STATEMENT_TIMEOUT_MS", "750"),
        ]))
        .unwrap();
        let db = config.db_config().unwrap();
        assert_eq!(db.max_connections, 8);
        assert_eq!(db.statement_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "topsecret")])).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("topsecret"));
        assert!(!printed.contains("db_password"));
    }
}

//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error, SQLSTATE)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← categorized by SQLSTATE                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError ← the taxonomy services and adapters speak                   │
//! │       │       (Deadlock is retried by the transaction service)          │
//! │       ▼                                                                 │
//! │  ApiError (pos-api) → HTTP status + {error, message, details}           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## SQLSTATE Mapping
//! ```text
//! 23505                          → UniqueViolation
//! 23503                          → ForeignKeyViolation
//! 23514                          → CheckViolation
//! 40P01 40001 55P03 57014        → Deadlock (retryable)
//! 08xxx 57P01 57P02 57P03        → Unavailable
//! ```

use samagri_core::{CoreError, ValidationError};
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate SKU
    /// - Duplicate customer or user email
    /// - A second inventory row for a product
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, unknown status, ...).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Deadlock, serialization failure, lock wait or statement timeout.
    ///
    /// The whole unit of work may be retried.
    #[error("Deadlock: {0}")]
    Deadlock(String),

    /// Connection lost or server shutting down.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Could not establish the pool.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether the failed unit of work may be retried as a whole.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Deadlock(_))
    }
}

/// Maps a unique constraint name to the field clients know it by.
fn field_for_constraint(constraint: Option<&str>) -> String {
    match constraint {
        Some("products_sku_key") => "sku",
        Some("customers_email_key") | Some("users_email_key") => "email",
        Some("inventories_product_id_key") => "product_id",
        Some("transaction_items_line_key") => "line_no",
        Some(other) => other,
        None => "unknown",
    }
    .to_string()
}

/// Pulls the offending value out of a detail like
/// `Key (sku)=(DAL-1KG) already exists.`
fn value_from_detail(detail: Option<&str>) -> String {
    detail
        .and_then(|d| d.split_once(")=("))
        .and_then(|(_, rest)| rest.rsplit_once(')'))
        .map(|(value, _)| value.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound      → DbError::NotFound
/// sqlx::Error::Database         → classified by SQLSTATE (see module docs)
/// sqlx::Error::PoolTimedOut     → DbError::PoolExhausted
/// sqlx::Error::Io / Tls / Closed→ DbError::Unavailable
/// Other                         → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                let message = db_err.message().to_string();

                match code.as_str() {
                    "23505" => {
                        let detail = db_err
                            .try_downcast_ref::<PgDatabaseError>()
                            .and_then(|pg| pg.detail());
                        DbError::UniqueViolation {
                            field: field_for_constraint(db_err.constraint()),
                            value: value_from_detail(detail),
                        }
                    }
                    "23503" => DbError::ForeignKeyViolation { message },
                    "23514" => DbError::CheckViolation { message },
                    "40P01" | "40001" | "55P03" | "57014" => DbError::Deadlock(message),
                    "57P01" | "57P02" | "57P03" => DbError::Unavailable(message),
                    c if c.starts_with("08") => DbError::Unavailable(message),
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::Unavailable("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::Unavailable(e.to_string()),

            sqlx::Error::Tls(e) => DbError::Unavailable(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Store failures expressed in the domain taxonomy.
impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => CoreError::Conflict { field, value },
            DbError::ForeignKeyViolation { message } => CoreError::NotFound {
                entity: "Referenced row".to_string(),
                id: message,
            },
            DbError::CheckViolation { message } => {
                CoreError::Validation(ValidationError::invalid_format("value", message))
            }
            DbError::Deadlock(message) => CoreError::Deadlock(message),
            DbError::Unavailable(message) | DbError::ConnectionFailed(message) => {
                CoreError::Unavailable(message)
            }
            DbError::PoolExhausted => CoreError::Unavailable("connection pool exhausted".into()),
            other => CoreError::Internal(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from_detail() {
        assert_eq!(
            value_from_detail(Some("Key (sku)=(DAL-1KG) already exists.")),
            "DAL-1KG"
        );
        assert_eq!(
            value_from_detail(Some("Key (email)=(a(b)@c.np) already exists.")),
            "a(b)@c.np"
        );
        assert_eq!(value_from_detail(None), "unknown");
    }

    #[test]
    fn test_field_for_constraint() {
        assert_eq!(field_for_constraint(Some("products_sku_key")), "sku");
        assert_eq!(field_for_constraint(Some("users_email_key")), "email");
        assert_eq!(field_for_constraint(None), "unknown");
    }

    #[test]
    fn test_core_error_mapping() {
        let core: CoreError = DbError::duplicate("sku", "DAL-1KG").into();
        assert_eq!(core.kind(), "conflict");

        let core: CoreError = DbError::Deadlock("40P01".into()).into();
        assert!(core.is_retryable());

        let core: CoreError = DbError::PoolExhausted.into();
        assert_eq!(core.kind(), "unavailable");

        let core: CoreError = DbError::QueryFailed("syntax".into()).into();
        assert_eq!(core.kind(), "internal");
    }

    #[test]
    fn test_pool_errors() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::Unavailable(_)
        ));
    }
}

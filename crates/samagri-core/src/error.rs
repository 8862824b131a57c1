//! # Error Types
//!
//! Domain-specific error types for samagri-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  samagri-core errors (this file)                                        │
//! │  ├── CoreError        - The error taxonomy every service surfaces       │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  samagri-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures, mapped INTO CoreError           │
//! │                                                                         │
//! │  pos-api errors (in app)                                                │
//! │  └── ApiError         - What HTTP clients see {error, message, details} │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError                            │
//! │                              │                                          │
//! │                              └──► ApiError → HTTP status               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, field, etc.)
//! 3. Every variant has a stable kebab-case kind name, see [`CoreError::kind`]

use serde_json::json;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are the only errors services hand to adapters. Store failures are
/// converted into this taxonomy by the persistence gateway.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A generic entity lookup missed.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist in database
    /// - Product was soft-deleted
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// The product exists but has no inventory row.
    #[error("Inventory missing for product {0}")]
    InventoryMissing(i64),

    /// Customer cannot be found (missing or soft-deleted).
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    /// Insufficient stock to complete a sale or adjustment.
    ///
    /// ## When This Occurs
    /// - Trying to sell more than the locked inventory row holds
    /// - A negative stock adjustment larger than the current quantity
    ///
    /// ## User Workflow
    /// ```text
    /// POST /transactions (product 1, qty: 2)
    ///      │
    ///      ▼
    /// Lock inventory row: available=1
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 1, available: 1, requested: 2 }
    ///      │
    ///      ▼
    /// 409 {"error":"insufficient-stock","details":{"productId":1,...}}
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// A unique constraint was violated on create.
    #[error("{field} '{value}' already exists")]
    Conflict { field: String, value: String },

    /// The store reported a deadlock or lock timeout. Retryable.
    #[error("Deadlock detected: {0}")]
    Deadlock(String),

    /// The store is unreachable, or the retry budget ran out.
    #[error("Datastore unavailable: {0}")]
    Unavailable(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Creates a generic not-found error.
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal(message.into())
    }

    /// Stable, kebab-case name of the error kind.
    ///
    /// This is the `error` field of every HTTP error body.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::NotFound { .. } => "not-found",
            CoreError::ProductNotFound(_) => "product-not-found",
            CoreError::InventoryMissing(_) => "inventory-missing",
            CoreError::CustomerNotFound(_) => "customer-not-found",
            CoreError::InsufficientStock { .. } => "insufficient-stock",
            CoreError::Conflict { .. } => "conflict",
            CoreError::Deadlock(_) => "deadlock",
            CoreError::Unavailable(_) => "unavailable",
            CoreError::Internal(_) => "internal",
        }
    }

    /// Structured payload for kinds that carry one.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => Some(json!({
                "productId": product_id,
                "available": available,
                "requested": requested,
            })),
            CoreError::Conflict { field, value } => Some(json!({
                "field": field,
                "value": value,
            })),
            _ => None,
        }
    }

    /// Whether the whole unit of work may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Deadlock(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any unit of work is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid email, invalid amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn invalid_format(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 1,
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 1: available 1, requested 2"
        );
    }

    #[test]
    fn test_kinds_are_kebab_case() {
        assert_eq!(CoreError::ProductNotFound(3).kind(), "product-not-found");
        assert_eq!(CoreError::InventoryMissing(3).kind(), "inventory-missing");
        assert_eq!(CoreError::CustomerNotFound(3).kind(), "customer-not-found");
        assert_eq!(CoreError::not_found("Transaction", 9).kind(), "not-found");
        assert_eq!(
            CoreError::from(ValidationError::required("items")).kind(),
            "validation"
        );
    }

    #[test]
    fn test_insufficient_stock_details() {
        let err = CoreError::InsufficientStock {
            product_id: 1,
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.details(),
            Some(json!({"productId": 1, "available": 1, "requested": 2}))
        );
        assert!(CoreError::ProductNotFound(1).details().is_none());
    }

    #[test]
    fn test_only_deadlock_is_retryable() {
        assert!(CoreError::Deadlock("40P01".into()).is_retryable());
        assert!(!CoreError::Unavailable("down".into()).is_retryable());
        assert!(!CoreError::internal("boom").is_retryable());
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("sku");
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        };
        assert_eq!(err.to_string(), "password must be at least 8 characters");
    }
}

//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the POS API                            │
//! │                                                                         │
//! │  Client                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  POST /transactions                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Bad JSON / path / query? ─── JsonRejection ─────────┐          │  │
//! │  │         │                                            │          │  │
//! │  │         ▼                                            ▼          │  │
//! │  │  Service error? ─── CoreError (DbError mapped) ─── ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄────────────────────────────────────────────────────────────────────  │
//! │                                                                         │
//! │  HTTP/1.1 409 Conflict                                                  │
//! │  {"error":"insufficient-stock",                                         │
//! │   "message":"Insufficient stock for product 1: ...",                    │
//! │   "details":{"productId":1,"available":1,"requested":2}}                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Mapping
//! ```text
//! validation                                        → 400
//! unauthorized                                      → 401
//! forbidden                                         → 403
//! not-found product-not-found inventory-missing
//!   customer-not-found                              → 404
//! insufficient-stock conflict                       → 409
//! deadlock unavailable                              → 503
//! internal                                          → 500
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use samagri_core::{CoreError, ValidationError};
use samagri_db::DbError;

/// Error returned from HTTP handlers.
///
/// ## Serialization
/// This is what the client receives when a request fails:
/// ```json
/// {
///   "error": "product-not-found",
///   "message": "Product not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error kind
    #[serde(rename = "error")]
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Structured payload, e.g. stock figures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error kinds for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// Input validation failed (400)
    Validation,

    /// Missing or invalid bearer token (401)
    Unauthorized,

    /// Authenticated, but the role may not do this (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,
    ProductNotFound,
    InventoryMissing,
    CustomerNotFound,

    /// Not enough stock (409)
    InsufficientStock,

    /// Unique constraint violated (409)
    Conflict,

    /// Retry budget exhausted on lock contention (503)
    Deadlock,

    /// Datastore unreachable (503)
    Unavailable,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound
            | ErrorCode::ProductNotFound
            | ErrorCode::InventoryMissing
            | ErrorCode::CustomerNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Deadlock | ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Validation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let details = err.details();
        let code = match &err {
            CoreError::Validation(_) => ErrorCode::Validation,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::ProductNotFound(_) => ErrorCode::ProductNotFound,
            CoreError::InventoryMissing(_) => ErrorCode::InventoryMissing,
            CoreError::CustomerNotFound(_) => ErrorCode::CustomerNotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::Conflict { .. } => ErrorCode::Conflict,
            CoreError::Deadlock(_) => ErrorCode::Deadlock,
            CoreError::Unavailable(_) => ErrorCode::Unavailable,
            CoreError::Internal(_) => ErrorCode::Internal,
        };

        let message = match code {
            ErrorCode::Internal => {
                // Log the actual error but return a generic message
                tracing::error!(error = %err, "Internal error");
                "Internal server error".to_string()
            }
            _ => err.to_string(),
        };

        ApiError {
            code,
            message,
            details,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_carries_details() {
        let err: ApiError = CoreError::InsufficientStock {
            product_id: 1,
            available: 1,
            requested: 2,
        }
        .into();

        assert_eq!(err.status(), StatusCode::CONFLICT);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "insufficient-stock");
        assert_eq!(
            json["details"],
            serde_json::json!({"productId": 1, "available": 1, "requested": 2})
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::from(ValidationError::required("items")), StatusCode::BAD_REQUEST),
            (CoreError::ProductNotFound(9), StatusCode::NOT_FOUND),
            (CoreError::InventoryMissing(9), StatusCode::NOT_FOUND),
            (CoreError::CustomerNotFound(9), StatusCode::NOT_FOUND),
            (
                CoreError::Conflict {
                    field: "sku".to_string(),
                    value: "X".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (CoreError::Deadlock("x".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (CoreError::Unavailable("x".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (CoreError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = ApiError::from(CoreError::internal("connection string leaked"));
        assert_eq!(err.message, "Internal server error");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_omitted_when_absent() {
        let json = serde_json::to_value(ApiError::unauthorized("missing token")).unwrap();
        assert_eq!(json["error"], "unauthorized");
        assert!(json.get("details").is_none());
    }
}

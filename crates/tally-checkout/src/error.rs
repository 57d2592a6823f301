//! # Checkout Error Type
//!
//! The error a checkout submission returns, with a stable [`ErrorKind`] any
//! transport can map without reading messages.
//!
//! ## Error Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ─────────────────────────────► VALIDATION_ERROR       │
//! │  CoreError::ProductNotFound ──────────────────► NOT_FOUND              │
//! │  CoreError::InsufficientStock ────────────────► INSUFFICIENT_STOCK     │
//! │  DbError::Rejected(core) ─────── as core ─────►                        │
//! │  DbError::LockTimeout / PoolExhausted ────────► INTERNAL (retryable)   │
//! │  any other DbError ── logged, generic msg ────► INTERNAL               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_db::DbError;
use thiserror::Error;

/// Why a checkout submission failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The request was malformed. No collaborator was called.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// None of the scanned serials matched a product.
    #[error("No product found for serials: {serials}")]
    NotFound { serials: String },

    /// A line asked for more units than are in stock. Nothing was reserved.
    #[error("Insufficient stock for {name} ({serial}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        serial: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Collaborator, persistence, lock or task failure. The message is safe
    /// to show; details are in the logs.
    #[error("{message}")]
    Internal { message: String, retryable: bool },
}

/// Stable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InsufficientStock,
    Internal,
    ValidationError,
}

impl ErrorKind {
    /// The serialized code, e.g. `"INSUFFICIENT_STOCK"`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorKind::Internal => "INTERNAL",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CheckoutError {
    /// Creates a non-retryable internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CheckoutError::Internal {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates an internal error that may clear up on retry.
    pub fn transient(message: impl Into<String>) -> Self {
        CheckoutError::Internal {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::Validation(_) => ErrorKind::ValidationError,
            CheckoutError::NotFound { .. } => ErrorKind::NotFound,
            CheckoutError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CheckoutError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether resubmitting the same request may succeed.
    ///
    /// Insufficient stock counts: stock may be replenished.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::InsufficientStock { .. } => true,
            CheckoutError::Internal { retryable, .. } => *retryable,
            CheckoutError::Validation(_) | CheckoutError::NotFound { .. } => false,
        }
    }

    /// Serializable view of this error.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.kind(),
            message: self.to_string(),
            retryable: self.is_retryable(),
        }
    }
}

/// What a transport sends back when a checkout fails.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for MacBook Pro (43N23P): available 10, requested 11",
///   "retryable": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound { serials } => CheckoutError::NotFound { serials },
            CoreError::InsufficientStock {
                product_id,
                serial,
                name,
                available,
                requested,
            } => CheckoutError::InsufficientStock {
                product_id,
                serial,
                name,
                available,
                requested,
            },
            CoreError::Validation(err) => CheckoutError::Validation(err),
        }
    }
}

/// Converts database errors, logging the detail and keeping the message
/// generic.
impl From<DbError> for CheckoutError {
    fn from(err: DbError) -> Self {
        if err.is_transient() {
            tracing::warn!("Transient database error: {}", err);
            let message = match err {
                DbError::LockTimeout => "Inventory is busy, try again",
                _ => "Checkout service is busy, try again",
            };
            return CheckoutError::transient(message);
        }

        match err {
            DbError::Rejected(core) => core.into(),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                CheckoutError::internal("Database unavailable")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                CheckoutError::internal("Checkout could not be committed")
            }
            other => {
                tracing::error!("Database error during checkout: {}", other);
                CheckoutError::internal("Checkout failed")
            }
        }
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_serialize_as_stable_codes() {
        let json = serde_json::to_string(&ErrorKind::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
        assert_eq!(ErrorKind::ValidationError.as_str(), "VALIDATION_ERROR");
        assert_eq!(ErrorKind::NotFound.to_string(), "NOT_FOUND");
    }

    #[test]
    fn test_rejected_stock_keeps_details() {
        let err: CheckoutError = DbError::Rejected(CoreError::InsufficientStock {
            product_id: 2,
            serial: "43N23P".to_string(),
            name: "MacBook Pro".to_string(),
            available: 10,
            requested: 11,
        })
        .into();

        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock { available: 10, requested: 11, .. }
        ));
    }

    #[test]
    fn test_lock_timeout_is_retryable_internal() {
        let err: CheckoutError = DbError::LockTimeout.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Inventory is busy, try again");

        let err: CheckoutError = DbError::PoolExhausted.into();
        assert!(err.is_retryable());

        let err: CheckoutError = DbError::TransactionFailed("aborted".into()).into();
        assert!(!err.is_retryable());

        let err: CheckoutError = DbError::QueryFailed("no such table: products".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_retryable());
        // Internals stay out of the message.
        assert_eq!(err.to_string(), "Checkout failed");
    }

    #[test]
    fn test_validation_and_not_found() {
        let err: CheckoutError = ValidationError::Required {
            field: "serials".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(!err.is_retryable());

        let err: CheckoutError = CoreError::ProductNotFound {
            serials: "NOPE".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_error_response_body() {
        let body = CheckoutError::transient("Inventory is busy, try again").to_response();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "INTERNAL");
        assert_eq!(json["retryable"], true);
    }
}

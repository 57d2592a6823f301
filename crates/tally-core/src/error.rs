//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tally-checkout errors                                                 │
//! │  └── CheckoutError    - What the transport sees (kind + message)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → CheckoutError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// None of the scanned serials matched a known product.
    #[error("Product not found: {serials}")]
    ProductNotFound { serials: String },

    /// Insufficient stock to complete the checkout.
    ///
    /// ## When This Occurs
    /// Detected inside the reservation transaction, after the stock row is
    /// locked:
    /// ```text
    /// Checkout line (qty: 11)
    ///      │
    ///      ▼
    /// Locked stock: 10
    ///      │
    ///      ▼
    /// InsufficientStock { serial: "43N23P", available: 10, requested: 11 }
    ///      │
    ///      ▼
    /// Transaction rolled back, no stock row modified
    /// ```
    #[error("Insufficient stock for {name} ({serial}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        serial: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when the scanned input doesn't meet requirements.
/// They are raised before any lookup runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., serial with whitespace).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product_id: 2,
            serial: "43N23P".to_string(),
            name: "MacBook Pro".to_string(),
            available: 10,
            requested: 11,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for MacBook Pro (43N23P): available 10, requested 11"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "serials".to_string(),
        };
        assert_eq!(err.to_string(), "serials is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "serial".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

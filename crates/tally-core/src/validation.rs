//! # Validation Module
//!
//! Scan input validation. Runs before any lookup so that a malformed request
//! never reaches the catalog or the stock ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport / CLI                                              │
//! │  └── Folds raw scans into ScannedItems                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: CheckoutService::submit                                      │
//! │  └── THIS MODULE: empty request, serial format, scan counts            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE serials                                                    │
//! │  └── CHECK (quantity >= 0) on stock levels                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_scan_quantity, validate_serial};
//!
//! validate_serial("43N23P").unwrap();
//! validate_scan_quantity(2).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::ScannedItems;
use crate::{MAX_CHECKOUT_LINES, MAX_ITEM_QUANTITY, MAX_SERIAL_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product serial as scanned.
///
/// ## Rules
/// - Must not be empty or blank
/// - At most [`MAX_SERIAL_LEN`] characters
/// - Only letters, digits, hyphens and underscores (no surrounding whitespace)
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_serial;
///
/// assert!(validate_serial("A304SD").is_ok());
/// assert!(validate_serial("").is_err());
/// assert!(validate_serial(" A304SD").is_err());
/// ```
pub fn validate_serial(serial: &str) -> ValidationResult<()> {
    if serial.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "serial".to_string(),
        });
    }

    if serial.chars().count() > MAX_SERIAL_LEN {
        return Err(ValidationError::TooLong {
            field: "serial".to_string(),
            max: MAX_SERIAL_LEN,
        });
    }

    if !serial
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "serial".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the scan count of one serial.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`] (999)
pub fn validate_scan_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a whole checkout request.
///
/// ## Rules
/// - At least one serial
/// - At most [`MAX_CHECKOUT_LINES`] distinct serials
/// - Every serial and count valid on its own
///
/// The first failure is returned.
pub fn validate_scanned_items(items: &ScannedItems) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "serials".to_string(),
        });
    }

    if items.len() > MAX_CHECKOUT_LINES {
        return Err(ValidationError::OutOfRange {
            field: "serials".to_string(),
            min: 1,
            max: MAX_CHECKOUT_LINES as i64,
        });
    }

    for (serial, qty) in items.iter() {
        validate_serial(serial)?;
        validate_scan_quantity(qty)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_validate_serial() {
        assert!(validate_serial("120P90").is_ok());
        assert!(validate_serial("SKU_1-A").is_ok());

        assert!(matches!(validate_serial(""), Err(ValidationError::Required { .. })));
        assert!(matches!(validate_serial("   "), Err(ValidationError::Required { .. })));
        assert!(matches!(
            validate_serial("has space"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_serial(&"A".repeat(MAX_SERIAL_LEN + 1)),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(validate_serial(&"A".repeat(MAX_SERIAL_LEN)).is_ok());
    }

    #[test]
    fn test_validate_scan_quantity() {
        assert!(validate_scan_quantity(1).is_ok());
        assert!(validate_scan_quantity(999).is_ok());

        assert!(validate_scan_quantity(0).is_err());
        assert!(validate_scan_quantity(-3).is_err());
        assert!(validate_scan_quantity(1000).is_err());
    }

    #[test]
    fn test_empty_request_is_required_error() {
        let err = validate_scanned_items(&ScannedItems::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Required {
                field: "serials".to_string()
            }
        );
    }

    #[test]
    fn test_request_with_bad_count_is_rejected() {
        let mut counts = BTreeMap::new();
        counts.insert("120P90".to_string(), 2);
        counts.insert("43N23P".to_string(), 0);

        let err = validate_scanned_items(&ScannedItems::from_counts(counts)).unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));
    }

    #[test]
    fn test_too_many_lines_is_rejected() {
        let scans = ScannedItems::from_scans((0..=MAX_CHECKOUT_LINES).map(|i| format!("S{i}")));
        assert!(matches!(
            validate_scanned_items(&scans),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_valid_request() {
        let scans = ScannedItems::from_scans(["43N23P", "234234", "43N23P"]);
        assert!(validate_scanned_items(&scans).is_ok());
    }
}

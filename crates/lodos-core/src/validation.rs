//! # Validation Module
//!
//! Input validation for engine operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Engine entry (this module)                                │
//! │  ├── Rejects bad input before a statement runs                      │
//! │  └── Typed ValidationError, no state change                         │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: Database (SQLite)                                         │
//! │  ├── NOT NULL / CHECK / UNIQUE constraints                          │
//! │  └── Foreign key constraints                                        │
//! │                                                                     │
//! │  Defense in depth: the schema backstops what the code checks.       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{DiscountKind, LineDiscount};
use crate::{FULL_BPS, MAX_LINE_QUANTITY, MAX_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name and returns the trimmed value.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 32 characters
///
/// A sale cannot be started, and so can never be finalized, without one.
///
/// ## Example
/// ```rust
/// use lodos_core::validation::validate_customer_name;
///
/// assert_eq!(validate_customer_name(" ADA LOVELACE ").unwrap(), "ADA LOVELACE");
/// assert!(validate_customer_name("").is_err());
/// ```
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_name",
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_name",
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a catalog item name and returns the trimmed value.
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required { field: "item_name" });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "item_name",
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantity" });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity",
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price",
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a campaign threshold.
pub fn validate_min_quantity(min_quantity: i64) -> ValidationResult<()> {
    if min_quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "min_quantity",
        });
    }

    Ok(())
}

/// Validates a campaign rule value for its kind: basis points must stay
/// within 0..=10000, cent amounts must be non-negative.
pub fn validate_rule_value(kind: DiscountKind, value: i64) -> ValidationResult<()> {
    match kind {
        DiscountKind::Percent => {
            if !(0..=FULL_BPS as i64).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: "discount_value",
                    min: 0,
                    max: FULL_BPS as i64,
                });
            }
        }
        DiscountKind::Fixed => {
            if value < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "discount_value",
                    min: 0,
                    max: i64::MAX,
                });
            }
        }
    }

    Ok(())
}

/// Validates a caller-supplied first-insert discount.
pub fn validate_line_discount(discount: &LineDiscount) -> ValidationResult<()> {
    if discount.percent_bps > FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: "explicit_discount_percent",
            min: 0,
            max: FULL_BPS as i64,
        });
    }

    if discount.amount_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "explicit_discount_amount",
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Error Types
//!
//! Domain-specific error types for lodos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  lodos-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  lodos-db errors (separate crate)                                   │
//! │  ├── DbError          - Store failures (rolled back in full)        │
//! │  └── EngineError      - CoreError | DbError at the facade           │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → EngineError → caller           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected operation leaves no state change behind; callers can always
//! distinguish a failure from a legitimate zero or empty result.

use thiserror::Error;

use crate::types::SaleStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and lookup failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Catalog item cannot be found.
    #[error("item not found: {0}")]
    ItemNotFound(i64),

    /// Sale cannot be found.
    ///
    /// Also raised after cancellation: a sale's lines exist only while the
    /// sale exists, so reads of a cancelled sale fail rather than return
    /// an empty cart that looks legitimate.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// No cart line exists for the given sale and item.
    #[error("sale {sale_id} has no line for item {item_id}")]
    LineNotFound { sale_id: String, item_id: i64 },

    /// Sale is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding items to a paid or cancelled sale
    /// - Finalizing a sale that is already paid (re-finalization is a
    ///   rejected operation, not a silent overwrite)
    /// - Cancelling a terminal sale
    #[error("sale {sale_id} is {status:?}: cannot {action}")]
    InvalidSaleStatus {
        sale_id: String,
        status: SaleStatus,
        action: &'static str,
    },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

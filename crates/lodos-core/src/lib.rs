//! # lodos-core: Pure Business Logic for Lodos POS
//!
//! This crate is the heart of the cart/discount/totals engine. It contains
//! all pricing rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Lodos POS Architecture                         │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │            Cashier UI / Reporting (external callers)        │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │                lodos-db (SaleEngine facade)                 │   │
//! │  │    start_sale, add_item, amount_due, finalize_payment ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │               ★ lodos-core (THIS CRATE) ★                   │   │
//! │  │                                                             │   │
//! │  │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐  │   │
//! │  │  │  types   │  │  money   │  │ discount │  │ validation │  │   │
//! │  │  │ Item     │  │  Money   │  │ rule     │  │  name/qty  │  │   │
//! │  │  │ Sale     │  │  (cents) │  │ pricing  │  │  checks    │  │   │
//! │  │  └──────────┘  └──────────┘  └──────────┘  └────────────┘  │   │
//! │  │                                                             │   │
//! │  │  NO I/O • NO DATABASE • NO CLOCKS • PURE FUNCTIONS          │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Sale, CartLine, CampaignRule, ...)
//! - [`money`] - Money type with integer-cent arithmetic (no floating point!)
//! - [`discount`] - The pure discount engine: rule selection + line pricing
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output; the discount pass is
//!    idempotent because every pass re-derives from `unit_price * quantity`
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64); percentages
//!    are basis points (u32)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{price_line, select_rule, LinePricing};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of customer and item names.
///
/// Matches the persisted column constraint; keeping it here lets the
/// validation layer reject bad input before a statement ever runs.
pub const MAX_NAME_LEN: usize = 32;

/// Maximum quantity of a single item on one cart line.
///
/// Guards against fat-finger quantities (1000 typed instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// One hundred percent, expressed in basis points.
pub const FULL_BPS: u32 = 10_000;

//! # Domain Types
//!
//! Core domain types for the cart/discount/totals engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐   ┌────────────────┐   ┌────────────────┐       │
//! │  │     Item      │   │  CampaignRule  │   │      Sale      │       │
//! │  │ ───────────── │   │ ────────────── │   │ ────────────── │       │
//! │  │ id (i64)      │◄──│ item_id (FK)   │   │ id (epoch-rnd) │       │
//! │  │ name          │   │ kind (% | ₵)   │   │ customer_name  │       │
//! │  │ price_cents   │   │ value          │   │ status         │       │
//! │  │ stock_count   │   │ min_quantity   │   │ totals         │       │
//! │  └───────┬───────┘   └────────────────┘   └────────┬───────┘       │
//! │          │                                         │               │
//! │          │           ┌────────────────┐            │               │
//! │          └──────────►│    CartLine    │◄───────────┘               │
//! │                      │ ────────────── │                            │
//! │                      │ one per        │                            │
//! │                      │ (sale, item)   │                            │
//! │                      └────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All money fields are integer cents; all percentages are basis points.
//! The `*_cents`/`*_bps` raw fields mirror the persisted columns, with
//! `Money` accessors for arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Item (catalog)
// =============================================================================

/// A catalog item available for sale.
///
/// Created and edited by catalog management; the cart engine treats items
/// as read-only during a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier.
    pub id: i64,

    /// Display name shown to the cashier (at most 32 chars).
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock_count: i64,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Campaign Rules
// =============================================================================

/// How a campaign discount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is basis points taken off the line base.
    Percent,
    /// `value` is a cent amount taken off the line base, clamped to the base.
    Fixed,
}

/// A quantity-threshold promotional discount for one item.
///
/// Multiple rules may exist per item at different thresholds. The winning
/// rule for a line is the one with the **largest `min_quantity` the line's
/// quantity still satisfies**, not the one with the best discount amount.
/// Ties are broken by lowest rule id so the pass stays deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CampaignRule {
    /// Unique identifier, also the deterministic tie-break key.
    pub id: i64,

    /// Item this rule applies to.
    pub item_id: i64,

    /// Percent or fixed.
    pub kind: DiscountKind,

    /// Basis points when `kind` is percent, cents when fixed.
    pub value: i64,

    /// Minimum line quantity for the rule to apply.
    pub min_quantity: i64,
}

impl CampaignRule {
    /// Whether a line of `quantity` units qualifies for this rule.
    #[inline]
    pub fn qualifies(&self, quantity: i64) -> bool {
        quantity >= self.min_quantity
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The lifecycle state of a sale.
///
/// The original data model kept both fresh and held sales under a single
/// "work in progress" payment marker; the explicit enum removes that
/// overload. `Paid` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Just created, cart being built.
    Open,
    /// Customer deferred; cart persists, sale stays resumable.
    Held,
    /// Payment recorded. Terminal.
    Paid,
    /// Cancelled, cart torn down. Terminal.
    Cancelled,
}

impl SaleStatus {
    /// Open and held sales accept cart mutations and can be finalized.
    #[inline]
    pub fn is_resumable(&self) -> bool {
        matches!(self, SaleStatus::Open | SaleStatus::Held)
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Open
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a finalized sale was paid.
///
/// Unset (`None` on [`Sale`]) until finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Bank transfer; `payment_reference` carries the sender name.
    BankTransfer,
}

// =============================================================================
// Sale
// =============================================================================

/// One customer transaction from creation to payment or cancellation.
///
/// `total_discount_cents` and `total_amount_cents` are derived values,
/// maintained exclusively by the aggregation pass. They always equal the
/// sums over the sale's cart lines after any recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Generated id, `<epoch-seconds>-<3-digit-random>`.
    pub id: String,

    /// When the sale was started.
    pub created_at: DateTime<Utc>,

    /// Customer display name (non-empty, at most 32 chars).
    pub customer_name: String,

    /// Lifecycle state.
    pub status: SaleStatus,

    /// Set when the sale is paid.
    pub payment_method: Option<PaymentMethod>,

    /// Free-form payment detail, e.g. sender name for bank transfers.
    pub payment_reference: Option<String>,

    /// Sum of line discounts in cents. Derived.
    pub total_discount_cents: i64,

    /// Net payable in cents. Derived.
    pub total_amount_cents: i64,

    /// When payment was recorded.
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Returns the net payable as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Returns the discount sum as Money.
    #[inline]
    pub fn total_discount(&self) -> Money {
        Money::from_cents(self.total_discount_cents)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One item's aggregated quantity, discount, and total within a sale.
///
/// Exactly one line exists per `(sale_id, item_id)`; adding an item that is
/// already in the cart merges quantities instead of creating a second row.
/// The discount fields are derived: every recompute pass overwrites them
/// from `unit_price * quantity` and the current campaign rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    /// Stable row id.
    pub id: i64,

    /// Owning sale.
    pub sale_id: String,

    /// Catalog item on this line.
    pub item_id: i64,

    /// Units of the item. Always positive.
    pub quantity: i64,

    /// Effective discount in basis points. Derived.
    pub discount_bps: u32,

    /// Discount amount in cents. Derived.
    pub discount_cents: i64,

    /// Net line total in cents (base minus discount). Derived.
    pub net_total_cents: i64,
}

impl CartLine {
    /// Returns the discount amount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Returns the net line total as Money.
    #[inline]
    pub fn net_total(&self) -> Money {
        Money::from_cents(self.net_total_cents)
    }
}

/// A cart line joined with its item name, as shown on the cashier screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLineView {
    pub item_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub discount_bps: u32,
    pub discount_cents: i64,
    pub net_total_cents: i64,
}

// =============================================================================
// Per-call Line Discount
// =============================================================================

/// Caller-supplied discount for the first insert of a cart line.
///
/// Honored only when the line does not exist yet; merging into an existing
/// line ignores it, and the next campaign recompute supersedes it entirely.
/// Campaign rules are the source of truth for discounts; this exists for
/// ad-hoc price overrides between recomputes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LineDiscount {
    /// Percentage off the unit price, in basis points.
    pub percent_bps: u32,

    /// Flat amount off the unit price, in cents.
    pub amount_cents: i64,
}

impl LineDiscount {
    /// No discount.
    pub const NONE: LineDiscount = LineDiscount {
        percent_bps: 0,
        amount_cents: 0,
    };

    #[inline]
    pub fn is_none(&self) -> bool {
        self.percent_bps == 0 && self.amount_cents == 0
    }
}

// =============================================================================
// Listing / Reporting Rows
// =============================================================================

/// Summary row for the on-hold listing (open and held sales).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OpenSaleSummary {
    pub sale_id: String,
    pub customer_name: String,
    pub total_amount_cents: i64,
}

/// One joined sale/line row of the sales report export.
///
/// The reporting batch job groups these by `sale_id`; the engine only
/// guarantees the joined figures equal the live per-line values at read
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleReportRow {
    pub sale_id: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub total_amount_cents: i64,
    pub item_name: String,
    pub item_price_cents: i64,
    pub quantity: i64,
    pub net_total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Open);
    }

    #[test]
    fn test_resumable_states() {
        assert!(SaleStatus::Open.is_resumable());
        assert!(SaleStatus::Held.is_resumable());
        assert!(!SaleStatus::Paid.is_resumable());
        assert!(!SaleStatus::Cancelled.is_resumable());
    }

    #[test]
    fn test_rule_qualifies() {
        let rule = CampaignRule {
            id: 1,
            item_id: 1,
            kind: DiscountKind::Percent,
            value: 500,
            min_quantity: 3,
        };
        assert!(!rule.qualifies(2));
        assert!(rule.qualifies(3));
        assert!(rule.qualifies(10));
    }

    #[test]
    fn test_line_discount_none() {
        assert!(LineDiscount::NONE.is_none());
        assert!(!LineDiscount { percent_bps: 100, amount_cents: 0 }.is_none());
    }
}

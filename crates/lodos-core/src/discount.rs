//! # Discount Engine
//!
//! Pure recomputation of per-line discounts from campaign rules.
//!
//! ## The Pass
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  For every cart line of a sale:                                     │
//! │                                                                     │
//! │  1. base = unit_price * quantity        (never the previous net!)   │
//! │  2. rule = select_rule(rules, quantity) (largest qualifying         │
//! │                                          min_quantity wins)         │
//! │  3. percent: discount = base * bps/10000                            │
//! │     fixed:   discount = min(base, value)                            │
//! │  4. net = max(0, base - discount)                                   │
//! │  5. write discount_bps / discount_cents / net_total_cents back      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 1 is what makes the pass **idempotent**: it always re-derives the
//! base from the catalog price and the quantity, so running it twice on
//! unchanged data produces identical results and discounts never compound
//! onto an already-discounted total.
//!
//! The storage layer owns reading lines and writing results back; this
//! module is deliberately free of I/O so the whole rule table can be
//! exercised in plain unit tests.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{CampaignRule, DiscountKind};
use crate::FULL_BPS;

// =============================================================================
// Line Pricing Result
// =============================================================================

/// The derived pricing of one cart line after a discount pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePricing {
    /// `unit_price * quantity`, the pre-discount reference value.
    pub base: Money,

    /// Effective discount in basis points (derived for fixed rules).
    pub discount_bps: u32,

    /// Discount amount. Never exceeds `base`.
    pub discount: Money,

    /// `base - discount`, floored at zero.
    pub net: Money,
}

impl LinePricing {
    /// Pricing of a line no rule applies to.
    fn undiscounted(base: Money) -> Self {
        LinePricing {
            base,
            discount_bps: 0,
            discount: Money::zero(),
            net: base.floor_zero(),
        }
    }
}

// =============================================================================
// Rule Selection
// =============================================================================

/// Selects the winning campaign rule for a line of `quantity` units.
///
/// Among the rules the quantity satisfies, the one with the **largest
/// `min_quantity`** wins; the discount amount plays no part in the choice.
/// Equal thresholds are broken by lowest rule id so repeated passes pick
/// the same rule. Returns `None` when no rule qualifies.
pub fn select_rule<'a>(rules: &'a [CampaignRule], quantity: i64) -> Option<&'a CampaignRule> {
    rules
        .iter()
        .filter(|rule| rule.qualifies(quantity))
        .max_by(|a, b| {
            a.min_quantity
                .cmp(&b.min_quantity)
                .then(b.id.cmp(&a.id))
        })
}

// =============================================================================
// Line Pricing
// =============================================================================

/// Computes the derived pricing of one cart line.
///
/// `rule` is the winner from [`select_rule`], or `None` for no discount.
///
/// ## Example
/// ```rust
/// use lodos_core::discount::{price_line, select_rule};
/// use lodos_core::types::{CampaignRule, DiscountKind};
/// use lodos_core::money::Money;
///
/// let rules = vec![CampaignRule {
///     id: 1,
///     item_id: 7,
///     kind: DiscountKind::Percent,
///     value: 1_000, // 10%
///     min_quantity: 3,
/// }];
///
/// let pricing = price_line(Money::from_cents(10_000), 3, select_rule(&rules, 3));
/// assert_eq!(pricing.base.cents(), 30_000);
/// assert_eq!(pricing.discount.cents(), 3_000);
/// assert_eq!(pricing.net.cents(), 27_000);
/// ```
pub fn price_line(unit_price: Money, quantity: i64, rule: Option<&CampaignRule>) -> LinePricing {
    let base = unit_price.multiply_quantity(quantity);

    let Some(rule) = rule else {
        return LinePricing::undiscounted(base);
    };

    let (discount, discount_bps) = match rule.kind {
        DiscountKind::Percent => {
            let bps = (rule.value.max(0) as u32).min(FULL_BPS);
            (base.percent_amount(bps), bps)
        }
        DiscountKind::Fixed => {
            // A fixed discount never exceeds the line's own base
            let amount = Money::from_cents(rule.value.max(0)).min(base.floor_zero());
            (amount, amount.bps_of(base))
        }
    };

    LinePricing {
        base,
        discount_bps,
        discount,
        net: (base - discount).floor_zero(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

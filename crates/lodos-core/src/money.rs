//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  A discount pass that runs on every cart read would accumulate      │
//! │  that drift across recomputations.                                  │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Cents                                        │
//! │    Every amount is an i64 count of the smallest currency unit.      │
//! │    Percentages are basis points (1 bps = 0.01%), so a 10% discount  │
//! │    on 30000 cents is exact integer math: 30000 * 1000 / 10000.      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::FULL_BPS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: the cart ledger's raw insert path may go below zero
///   when a caller-supplied discount exceeds the base; the recompute pass
///   normalizes it (see `lodos-db` engine docs)
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use lodos_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the given fraction of this amount, in basis points, rounded
    /// half-up.
    ///
    /// This is the percent-discount building block: a 10% campaign on a
    /// 30000-cent base is `base.percent_amount(1000)` = 3000 cents.
    ///
    /// ## Example
    /// ```rust
    /// use lodos_core::money::Money;
    ///
    /// let base = Money::from_cents(30_000);
    /// assert_eq!(base.percent_amount(1_000).cents(), 3_000); // 10%
    /// assert_eq!(base.percent_amount(825).cents(), 2_475);   // 8.25%
    /// ```
    pub fn percent_amount(&self, bps: u32) -> Money {
        // i128 keeps the intermediate product from overflowing on large carts
        let amount = (self.0 as i128 * bps as i128 + 5_000) / 10_000;
        Money(amount as i64)
    }

    /// Subtracts a percentage discount and returns the remaining amount.
    ///
    /// ## Example
    /// ```rust
    /// use lodos_core::money::Money;
    ///
    /// let base = Money::from_cents(10_000);
    /// assert_eq!(base.apply_percent_discount(1_000).cents(), 9_000);
    /// ```
    pub fn apply_percent_discount(&self, bps: u32) -> Money {
        *self - self.percent_amount(bps)
    }

    /// Expresses this amount as basis points of `base`, rounded half-up and
    /// clamped to 0..=10000.
    ///
    /// Used to derive the effective percentage of a fixed-amount discount.
    /// Returns 0 when `base` is zero or negative, since no meaningful ratio
    /// exists for a free line.
    pub fn bps_of(&self, base: Money) -> u32 {
        if base.0 <= 0 {
            return 0;
        }
        let bps = (self.0 as i128 * FULL_BPS as i128 + base.0 as i128 / 2) / base.0 as i128;
        bps.clamp(0, FULL_BPS as i128) as u32
    }

    /// Floors the value at zero.
    ///
    /// Line nets must never be negative after a recompute; this is the
    /// clamp of step 4 of the discount pass.
    #[inline]
    pub const fn floor_zero(&self) -> Money {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable debug formatting. Display formatting for receipts and
/// screens belongs to the presentation layer, which also owns localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

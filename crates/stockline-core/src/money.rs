//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The ERP reports prices as JSON numbers:                                │
//! │    1349.9999999 vs 1350.0  → a "modified" row nobody touched  ❌        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹1,350.00 = 135000 paise, compared exactly                          │
//! │    Floats are converted ONCE at the ERP boundary, never in the core    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockline_core::money::Money;
//!
//! let cost = Money::from_rupees(1000);
//! let price = cost.apply_markup_bps(3500); // +35%
//! assert_eq!(price, Money::from_rupees(1350));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: a user can type a negative cost into the console grid;
///   it must be representable so the validator can report it
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as the bare integer**: `135000`, not `{"0":135000}`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(5200).paise(), 520_000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees.saturating_mul(100))
    }

    /// Converts a decimal rupee amount read from an external system.
    ///
    /// Rounds half away from zero to the nearest paisa. Returns `None` for
    /// NaN, infinities and values outside the `i64` paise range; callers
    /// turn that into a data-quality error.
    ///
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees_f64(1350.004), Some(Money::from_paise(135000)));
    /// assert_eq!(Money::from_rupees_f64(f64::NAN), None);
    /// ```
    pub fn from_rupees_f64(rupees: f64) -> Option<Self> {
        if !rupees.is_finite() {
            return None;
        }
        let paise = (rupees * 100.0).round();
        if paise < i64::MIN as f64 || paise >= i64::MAX as f64 {
            return None;
        }
        Some(Money(paise as i64))
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the value as decimal rupees, for the ERP wire and display only.
    #[inline]
    pub fn to_rupees_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Returns `bps` basis points of this amount, rounded half away from zero.
    ///
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// // 18% GST on ₹1,350.00
    /// assert_eq!(Money::from_rupees(1350).portion_bps(1800), Money::from_paise(24300));
    /// ```
    pub fn portion_bps(&self, bps: i64) -> Money {
        Money(saturate(round_div(self.0 as i128 * bps as i128, 10_000)))
    }

    /// Adds a markup expressed in basis points (3500 = +35%).
    pub fn apply_markup_bps(&self, markup_bps: i64) -> Money {
        Money(saturate(round_div(
            self.0 as i128 * (10_000 + markup_bps as i128),
            10_000,
        )))
    }

    /// Relative difference from `baseline` in basis points, always positive.
    ///
    /// Returns `None` when the baseline is zero or negative (no meaningful
    /// ratio).
    ///
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// let before = Money::from_rupees(5200);
    /// let after = Money::from_rupees(6750);
    /// assert_eq!(after.change_bps_from(before), Some(2981));
    /// ```
    pub fn change_bps_from(&self, baseline: Money) -> Option<i64> {
        if baseline.0 <= 0 {
            return None;
        }
        let diff = (self.0 as i128 - baseline.0 as i128).abs();
        Some(saturate(round_div(diff * 10_000, baseline.0 as i128)))
    }

    /// Saturating subtraction; the console never wants a wrapped price.
    #[inline]
    pub const fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows `₹1350.00`; the frontend does locale grouping.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        self.saturating_sub(other)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

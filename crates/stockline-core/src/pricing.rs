//! # Pricing Engine
//!
//! Derives the sell price and margin of an item from its cost, GST slab and
//! stock level under a fixed rate card.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Rate Card (ENGINE_VERSION)                          │
//! │                                                                         │
//! │  markup = slab markup          18% GST → 35.00%    5% GST → 25.00%     │
//! │         + stock adjustment     stock ≤ 0   → +5.00 pts (backorder)      │
//! │                                stock ≥ 500 → −5.00 pts (clearance)      │
//! │                                                                         │
//! │  base_selling_price     = round(cost × (1 + markup))      ex-GST       │
//! │  gst_amount             = round(base × gst)                            │
//! │  selling_price_incl_gst = base + gst_amount                            │
//! │  margin                 = base − cost                                  │
//! │  margin_bps             = margin × 10000 / base                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure: the same inputs always give the same
//! [`DerivedPricing`]. Any change to the rate card defaults or to the
//! formula must bump [`ENGINE_VERSION`], which travels with every sync
//! payload so the ERP history can be attributed to a formula revision.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::GstRate;

/// Revision of the pricing formula and default rate card.
pub const ENGINE_VERSION: &str = "2026.1";

// =============================================================================
// Inputs & Outputs
// =============================================================================

/// The effective inputs of one row after working overrides are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingInputs {
    pub cost_price: Money,
    pub gst_rate: GstRate,
    pub stock_quantity: i64,
}

/// Computed pricing for one row. Never stored, always recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DerivedPricing {
    /// Formula revision that produced these numbers.
    pub engine_version: String,

    /// Total markup applied over cost, in basis points.
    pub markup_bps: i64,

    /// Ex-GST selling price.
    pub base_selling_price: Money,

    pub gst_amount: Money,

    /// Price the storefront shows.
    pub selling_price_incl_gst: Money,

    /// `base_selling_price - cost_price`.
    pub margin: Money,

    /// Margin as a share of the base price, in basis points.
    pub margin_bps: i64,
}

// =============================================================================
// Rate Card
// =============================================================================

/// Markup rules. The default card is the one [`ENGINE_VERSION`] names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateCard {
    /// Markup for 18% GST goods.
    pub standard_markup_bps: i64,

    /// Markup for 5% GST staples.
    pub staple_markup_bps: i64,

    /// Added when stock is zero or negative.
    pub backorder_adjust_bps: i64,

    /// Stock at or above this level is priced for clearance.
    pub overstock_threshold: i64,

    /// Added (normally negative) for overstocked items.
    pub overstock_adjust_bps: i64,
}

impl Default for RateCard {
    fn default() -> Self {
        RateCard {
            standard_markup_bps: 3500,
            staple_markup_bps: 2500,
            backorder_adjust_bps: 500,
            overstock_threshold: 500,
            overstock_adjust_bps: -500,
        }
    }
}

impl RateCard {
    /// Total markup for a slab at a stock level.
    pub fn markup_bps(&self, gst_rate: GstRate, stock_quantity: i64) -> i64 {
        let slab = match gst_rate {
            GstRate::Eighteen => self.standard_markup_bps,
            GstRate::Five => self.staple_markup_bps,
        };

        let adjustment = if stock_quantity <= 0 {
            self.backorder_adjust_bps
        } else if stock_quantity >= self.overstock_threshold {
            self.overstock_adjust_bps
        } else {
            0
        };

        slab + adjustment
    }

    /// Runs the formula for one set of inputs.
    pub fn derive(&self, inputs: &PricingInputs) -> DerivedPricing {
        let markup_bps = self.markup_bps(inputs.gst_rate, inputs.stock_quantity);
        let base_selling_price = inputs.cost_price.apply_markup_bps(markup_bps);
        let gst_amount = base_selling_price.portion_bps(inputs.gst_rate.bps());
        let margin = base_selling_price - inputs.cost_price;

        let margin_bps = if base_selling_price.is_positive() {
            let ratio = margin.paise() as i128 * 10_000 / base_selling_price.paise() as i128;
            ratio.clamp(i64::MIN as i128, i64::MAX as i128) as i64
        } else {
            0
        };

        DerivedPricing {
            engine_version: ENGINE_VERSION.to_string(),
            markup_bps,
            base_selling_price,
            gst_amount,
            selling_price_incl_gst: base_selling_price + gst_amount,
            margin,
            margin_bps,
        }
    }
}

/// Derives pricing with the default rate card.
///
/// ```rust
/// use stockline_core::money::Money;
/// use stockline_core::pricing::derive_pricing;
/// use stockline_core::types::GstRate;
///
/// let pricing = derive_pricing(Money::from_rupees(1000), GstRate::Eighteen, 100);
/// assert_eq!(pricing.base_selling_price, Money::from_rupees(1350));
/// assert_eq!(pricing.selling_price_incl_gst, Money::from_rupees(1593));
/// ```
pub fn derive_pricing(cost_price: Money, gst_rate: GstRate, stock_quantity: i64) -> DerivedPricing {
    RateCard::default().derive(&PricingInputs {
        cost_price,
        gst_rate,
        stock_quantity,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_slab() {
        let p = derive_pricing(Money::from_rupees(1000), GstRate::Eighteen, 100);
        assert_eq!(p.markup_bps, 3500);
        assert_eq!(p.base_selling_price, Money::from_rupees(1350));
        assert_eq!(p.gst_amount, Money::from_rupees(243));
        assert_eq!(p.selling_price_incl_gst, Money::from_rupees(1593));
        assert_eq!(p.margin, Money::from_rupees(350));
        // 350 / 1350 = 25.92%
        assert_eq!(p.margin_bps, 2592);
        assert_eq!(p.engine_version, ENGINE_VERSION);
    }

    #[test]
    fn test_staple_slab() {
        let p = derive_pricing(Money::from_rupees(800), GstRate::Five, 10);
        assert_eq!(p.markup_bps, 2500);
        assert_eq!(p.base_selling_price, Money::from_rupees(1000));
        assert_eq!(p.gst_amount, Money::from_rupees(50));
    }

    #[test]
    fn test_stock_adjustments() {
        let card = RateCard::default();
        assert_eq!(card.markup_bps(GstRate::Eighteen, 0), 4000);
        assert_eq!(card.markup_bps(GstRate::Eighteen, -3), 4000);
        assert_eq!(card.markup_bps(GstRate::Eighteen, 1), 3500);
        assert_eq!(card.markup_bps(GstRate::Eighteen, 499), 3500);
        assert_eq!(card.markup_bps(GstRate::Eighteen, 500), 3000);
        assert_eq!(card.markup_bps(GstRate::Five, 10_000), 2000);
    }

    #[test]
    fn test_zero_cost_is_total() {
        let p = derive_pricing(Money::zero(), GstRate::Five, 1);
        assert_eq!(p.base_selling_price, Money::zero());
        assert_eq!(p.margin, Money::zero());
        assert_eq!(p.margin_bps, 0);
    }

    #[test]
    fn test_rounding_to_paisa() {
        // ₹0.07 × 1.35 = 9.45 paise → 9
        let p = derive_pricing(Money::from_paise(7), GstRate::Eighteen, 1);
        assert_eq!(p.base_selling_price, Money::from_paise(9));
        // 9 × 18% = 1.62 → 2
        assert_eq!(p.gst_amount, Money::from_paise(2));
    }

    #[test]
    fn test_deterministic_across_calls() {
        let inputs = [
            (Money::zero(), GstRate::Five, 0),
            (Money::from_paise(1), GstRate::Eighteen, 1),
            (Money::from_rupees(1000), GstRate::Eighteen, 100),
            (Money::from_paise(123_457), GstRate::Five, 499),
            (Money::from_rupees(5000), GstRate::Eighteen, 500),
            (Money::from_paise(i64::MAX / 2), GstRate::Eighteen, 7),
        ];
        for (cost, gst, stock) in inputs {
            let first = derive_pricing(cost, gst, stock);
            let second = derive_pricing(cost, gst, stock);
            assert_eq!(first, second);
            assert_eq!(
                serde_json::to_vec(&first).unwrap(),
                serde_json::to_vec(&second).unwrap()
            );
        }
    }

    #[test]
    fn test_custom_card() {
        let card = RateCard {
            standard_markup_bps: 1000,
            ..RateCard::default()
        };
        let p = card.derive(&PricingInputs {
            cost_price: Money::from_rupees(100),
            gst_rate: GstRate::Eighteen,
            stock_quantity: 5,
        });
        assert_eq!(p.base_selling_price, Money::from_rupees(110));
    }
}

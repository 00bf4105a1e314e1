//! # Domain Types
//!
//! Snapshot, working-state and change types shared by the console pipeline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ItemSnapshot   │   │WorkingItemState │   │ChangeSummaryRow │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  item_code (PK) │◄──│  cost_price?    │──►│  item_code      │       │
//! │  │  cost_price     │   │  stock_qty?     │   │  new_cost?      │       │
//! │  │  stock_quantity │   └─────────────────┘   │  new_stock?     │       │
//! │  │  gst_rate       │     keyed by item_code  │  new_price      │       │
//! │  │  prev_price?    │     in a WorkingSet     └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `item_code` is the join key across every type in this module.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// GST Rate
// =============================================================================

/// GST slab applied to an item.
///
/// Only the two slabs the storefront sells under are representable; anything
/// else coming out of the ERP is a data-quality error.
///
/// On the wire the rate is the fraction the ERP uses (`0.05`, `0.18`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum GstRate {
    /// 5% slab (staples).
    Five,
    /// 18% slab (standard goods).
    Eighteen,
}

impl GstRate {
    /// Tolerance used when matching ERP floats to a slab.
    const EPSILON: f64 = 1e-9;

    /// Rate in basis points (500 = 5%).
    #[inline]
    pub const fn bps(&self) -> i64 {
        match self {
            GstRate::Five => 500,
            GstRate::Eighteen => 1800,
        }
    }

    /// Rate as a fraction, for the wire.
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.bps() as f64 / 10_000.0
    }

    /// Matches an exact basis-point value.
    pub fn from_bps(bps: i64) -> Option<Self> {
        match bps {
            500 => Some(GstRate::Five),
            1800 => Some(GstRate::Eighteen),
            _ => None,
        }
    }

    /// Matches a fraction (`0.05` / `0.18`).
    pub fn from_fraction(rate: f64) -> Option<Self> {
        if (rate - 0.05).abs() < Self::EPSILON {
            Some(GstRate::Five)
        } else if (rate - 0.18).abs() < Self::EPSILON {
            Some(GstRate::Eighteen)
        } else {
            None
        }
    }

    /// Like [`GstRate::from_fraction`], reporting the offending item.
    pub fn for_item(item_code: &str, rate: f64) -> CoreResult<Self> {
        Self::from_fraction(rate).ok_or_else(|| CoreError::UnsupportedGstRate {
            item_code: item_code.to_string(),
            rate: rate.to_string(),
        })
    }
}

impl TryFrom<f64> for GstRate {
    type Error = String;

    fn try_from(rate: f64) -> Result<Self, Self::Error> {
        GstRate::from_fraction(rate)
            .ok_or_else(|| format!("unsupported GST rate {}: expected 0.05 or 0.18", rate))
    }
}

impl From<GstRate> for f64 {
    fn from(rate: GstRate) -> f64 {
        rate.fraction()
    }
}

impl fmt::Display for GstRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GstRate::Five => write!(f, "5%"),
            GstRate::Eighteen => write!(f, "18%"),
        }
    }
}

// =============================================================================
// Item Snapshot
// =============================================================================

/// Last-known ERP read of one item. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSnapshot {
    /// ERP item code - the unique join key.
    pub item_code: String,

    /// Display name.
    pub item_name: String,

    /// Landed cost (ex-GST).
    pub cost_price: Money,

    /// On-hand stock. Can be negative in the ERP when backorders are allowed.
    pub stock_quantity: i64,

    /// GST slab.
    #[ts(type = "number")]
    pub gst_rate: GstRate,

    /// Base (ex-GST) selling price currently live in the ERP, if any.
    #[serde(default)]
    pub previous_base_selling_price: Option<Money>,
}

/// Checks the join-key invariant over a freshly fetched snapshot.
pub fn check_unique_item_codes(snapshot: &[ItemSnapshot]) -> CoreResult<()> {
    let mut seen = HashSet::with_capacity(snapshot.len());
    for item in snapshot {
        if !seen.insert(item.item_code.as_str()) {
            return Err(CoreError::DuplicateItemCode(item.item_code.clone()));
        }
    }
    Ok(())
}

// =============================================================================
// Working State
// =============================================================================

/// In-session overrides for one item. `None` means "use the snapshot".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WorkingItemState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
}

impl WorkingItemState {
    /// True if neither field is overridden.
    pub fn is_empty(&self) -> bool {
        self.cost_price.is_none() && self.stock_quantity.is_none()
    }

    /// True if any override differs from the snapshot value.
    pub fn differs_from(&self, snapshot: &ItemSnapshot) -> bool {
        self.cost_price.is_some_and(|c| c != snapshot.cost_price)
            || self
                .stock_quantity
                .is_some_and(|q| q != snapshot.stock_quantity)
    }
}

/// All unsaved edits of a console session, keyed by item code.
///
/// Ordered so orphan reports and edit files are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingSet {
    items: BTreeMap<String, WorkingItemState>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item_code: &str) -> Option<&WorkingItemState> {
        self.items.get(item_code)
    }

    /// Overrides the cost price of an item.
    pub fn set_cost(&mut self, item_code: impl Into<String>, cost_price: Money) {
        self.items.entry(item_code.into()).or_default().cost_price = Some(cost_price);
    }

    /// Overrides the stock quantity of an item.
    pub fn set_stock(&mut self, item_code: impl Into<String>, stock_quantity: i64) {
        self.items.entry(item_code.into()).or_default().stock_quantity = Some(stock_quantity);
    }

    /// Replaces the whole override for an item. Empty states are removed.
    pub fn insert(&mut self, item_code: impl Into<String>, state: WorkingItemState) {
        let item_code = item_code.into();
        if state.is_empty() {
            self.items.remove(&item_code);
        } else {
            self.items.insert(item_code, state);
        }
    }

    /// Drops every edit for an item.
    pub fn discard(&mut self, item_code: &str) -> Option<WorkingItemState> {
        self.items.remove(item_code)
    }

    /// Drops the edits for the given item codes. Edits for any other code,
    /// orphans included, stay in place.
    pub fn discard_all<'a, I>(&mut self, item_codes: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for code in item_codes {
            self.items.remove(code);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WorkingItemState)> {
        self.items.iter()
    }

    pub fn item_codes(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}

impl FromIterator<(String, WorkingItemState)> for WorkingSet {
    fn from_iter<T: IntoIterator<Item = (String, WorkingItemState)>>(iter: T) -> Self {
        let mut set = WorkingSet::new();
        for (code, state) in iter {
            set.insert(code, state);
        }
        set
    }
}

// =============================================================================
// Change Summary
// =============================================================================

/// One committed change: the unit of the sync payload.
///
/// Only fields that actually changed are set; the derived price is always
/// sent so the ERP never has to re-run the formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChangeSummaryRow {
    pub item_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cost_price: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_stock_quantity: Option<i64>,

    /// Newly derived ex-GST selling price.
    pub new_base_selling_price: Money,

    /// Baseline the change was validated against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_base_selling_price: Option<Money>,
}

impl ChangeSummaryRow {
    /// True if the row carries at least one input change.
    pub fn has_changes(&self) -> bool {
        self.new_cost_price.is_some() || self.new_stock_quantity.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Snapshot/Diff Builder
//!
//! Joins an ERP snapshot with in-session edits into the rows the console
//! grid renders.
//!
//! ## Row Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ItemSnapshot[i] ──┐                                                    │
//! │                    ├──► effective inputs (override wins)                │
//! │  WorkingSet[code] ─┘            │                                       │
//! │                                 ├──► RateCard::derive   → DerivedPricing│
//! │                                 ├──► validate(prev)     → ValidationRes │
//! │                                 └──► differs_from(snap) → is_modified   │
//! │                                                                         │
//! │  Output order == snapshot order (the grid indexes rows by position)     │
//! │  Edits without a snapshot item → ConsoleView::orphaned_item_codes       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{DerivedPricing, PricingInputs, RateCard};
use crate::types::{ChangeSummaryRow, GstRate, ItemSnapshot, WorkingSet};
use crate::validation::{validate, ValidationPolicy, ValidationResult};

// =============================================================================
// Console Row
// =============================================================================

/// One grid row. Recomputed on every edit, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConsoleRow {
    pub item_code: String,
    pub item_name: String,

    #[ts(type = "number")]
    pub gst_rate: GstRate,

    /// Effective cost (working override if present).
    pub cost_price: Money,

    /// Effective stock (working override if present).
    pub stock_quantity: i64,

    /// Snapshot cost, for the "was" column.
    pub snapshot_cost_price: Money,

    /// Snapshot stock, for the "was" column.
    pub snapshot_stock_quantity: i64,

    pub previous_base_selling_price: Option<Money>,

    pub pricing: DerivedPricing,

    pub validation: ValidationResult,

    /// True iff a working override differs from the snapshot.
    pub is_modified: bool,
}

impl ConsoleRow {
    pub fn inputs(&self) -> PricingInputs {
        PricingInputs {
            cost_price: self.cost_price,
            gst_rate: self.gst_rate,
            stock_quantity: self.stock_quantity,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.validation.is_blocking()
    }

    /// The sync payload for this row, or `None` if nothing changed.
    pub fn change_summary(&self) -> Option<ChangeSummaryRow> {
        if !self.is_modified {
            return None;
        }

        Some(ChangeSummaryRow {
            item_code: self.item_code.clone(),
            new_cost_price: (self.cost_price != self.snapshot_cost_price)
                .then_some(self.cost_price),
            new_stock_quantity: (self.stock_quantity != self.snapshot_stock_quantity)
                .then_some(self.stock_quantity),
            new_base_selling_price: self.pricing.base_selling_price,
            previous_base_selling_price: self.previous_base_selling_price,
        })
    }
}

// =============================================================================
// Diff Builder
// =============================================================================

/// Rate card and guardrail policy used to build rows.
#[derive(Debug, Clone, Default)]
pub struct DiffBuilder {
    pub card: RateCard,
    pub policy: ValidationPolicy,
}

impl DiffBuilder {
    pub fn new(card: RateCard, policy: ValidationPolicy) -> Self {
        DiffBuilder { card, policy }
    }

    /// Builds one row per snapshot item, in snapshot order.
    pub fn build_rows(&self, snapshot: &[ItemSnapshot], working: &WorkingSet) -> Vec<ConsoleRow> {
        snapshot
            .iter()
            .map(|item| self.build_row(item, working))
            .collect()
    }

    fn build_row(&self, item: &ItemSnapshot, working: &WorkingSet) -> ConsoleRow {
        let edit = working.get(&item.item_code).copied().unwrap_or_default();

        let inputs = PricingInputs {
            cost_price: edit.cost_price.unwrap_or(item.cost_price),
            gst_rate: item.gst_rate,
            stock_quantity: edit.stock_quantity.unwrap_or(item.stock_quantity),
        };

        let pricing = self.card.derive(&inputs);
        let validation = validate(
            item.previous_base_selling_price,
            &pricing,
            &inputs,
            &self.policy,
        );

        ConsoleRow {
            item_code: item.item_code.clone(),
            item_name: item.item_name.clone(),
            gst_rate: item.gst_rate,
            cost_price: inputs.cost_price,
            stock_quantity: inputs.stock_quantity,
            snapshot_cost_price: item.cost_price,
            snapshot_stock_quantity: item.stock_quantity,
            previous_base_selling_price: item.previous_base_selling_price,
            pricing,
            validation,
            is_modified: edit.differs_from(item),
        }
    }

    /// Rows plus the edits that no longer match any snapshot item.
    pub fn build_console(&self, snapshot: &[ItemSnapshot], working: &WorkingSet) -> ConsoleView {
        ConsoleView {
            rows: self.build_rows(snapshot, working),
            orphaned_item_codes: orphaned_edits(snapshot, working),
        }
    }
}

/// Builds rows with the default rate card and policy.
pub fn build_rows(snapshot: &[ItemSnapshot], working: &WorkingSet) -> Vec<ConsoleRow> {
    DiffBuilder::default().build_rows(snapshot, working)
}

/// Item codes edited in `working` but absent from `snapshot`, sorted.
pub fn orphaned_edits(snapshot: &[ItemSnapshot], working: &WorkingSet) -> Vec<String> {
    let known: HashSet<&str> = snapshot.iter().map(|i| i.item_code.as_str()).collect();
    working
        .item_codes()
        .filter(|code| !known.contains(code))
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Console View
// =============================================================================

/// Everything the grid needs for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConsoleView {
    pub rows: Vec<ConsoleRow>,

    /// Edits for items the latest snapshot no longer contains. Shown as a
    /// banner; they are never priced or synced.
    pub orphaned_item_codes: Vec<String>,
}

/// Footer counters for the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConsoleSummary {
    pub total: usize,
    pub modified: usize,
    /// Modified rows that cannot be synced.
    pub blocked: usize,
    pub with_warnings: usize,
}

impl ConsoleView {
    pub fn summary(&self) -> ConsoleSummary {
        self.rows.iter().fold(
            ConsoleSummary {
                total: self.rows.len(),
                ..ConsoleSummary::default()
            },
            |mut acc, row| {
                if row.is_modified {
                    acc.modified += 1;
                    if row.is_blocked() {
                        acc.blocked += 1;
                    }
                }
                if row.validation.has_warnings() {
                    acc.with_warnings += 1;
                }
                acc
            },
        )
    }

    pub fn changes(&self) -> CoreResult<Vec<ChangeSummaryRow>> {
        collect_changes(&self.rows)
    }
}

/// Turns the modified rows into a sync payload.
///
/// Blocking policy: if any modified row has an Error-severity issue the
/// whole payload is refused, listing those rows. Unmodified rows are never
/// checked; a stale warning on an untouched item must not stop a sync.
pub fn collect_changes(rows: &[ConsoleRow]) -> CoreResult<Vec<ChangeSummaryRow>> {
    let blocked: Vec<String> = rows
        .iter()
        .filter(|r| r.is_modified && r.is_blocked())
        .map(|r| r.item_code.clone())
        .collect();

    if !blocked.is_empty() {
        return Err(CoreError::SyncBlocked {
            item_codes: blocked,
        });
    }

    Ok(rows.iter().filter_map(ConsoleRow::change_summary).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkingItemState;
    use crate::validation::IssueCode;

    fn item(code: &str, cost_rupees: i64, gst: GstRate, prev_rupees: Option<i64>) -> ItemSnapshot {
        ItemSnapshot {
            item_code: code.to_string(),
            item_name: format!("{} name", code),
            cost_price: Money::from_rupees(cost_rupees),
            stock_quantity: 100,
            gst_rate: gst,
            previous_base_selling_price: prev_rupees.map(Money::from_rupees),
        }
    }

    fn catalog() -> Vec<ItemSnapshot> {
        vec![
            item("ITEM-001", 1000, GstRate::Eighteen, Some(1350)),
            item("ITEM-002", 800, GstRate::Five, Some(1000)),
            item("ITEM-003", 3850, GstRate::Eighteen, Some(5200)),
        ]
    }

    #[test]
    fn test_empty_working_set_keeps_snapshot_inputs() {
        let snapshot = catalog();
        let rows = build_rows(&snapshot, &WorkingSet::new());
        assert_eq!(rows.len(), snapshot.len());
        for (row, snap) in rows.iter().zip(&snapshot) {
            assert_eq!(row.item_code, snap.item_code);
            assert_eq!(row.cost_price, snap.cost_price);
            assert_eq!(row.stock_quantity, snap.stock_quantity);
            assert_eq!(row.gst_rate, snap.gst_rate);
            assert!(!row.is_modified);
        }
    }

    #[test]
    fn test_unedited_item_within_tolerance() {
        let rows = build_rows(&catalog(), &WorkingSet::new());
        let row = &rows[0];
        assert_eq!(row.pricing.base_selling_price, Money::from_rupees(1350));
        assert!(!row.validation.has_code(IssueCode::PriceJump));
        assert!(row.validation.ok);
    }

    #[test]
    fn test_cost_override_flags_price_jump() {
        let mut working = WorkingSet::new();
        working.set_cost("ITEM-003", Money::from_rupees(5000));

        let rows = build_rows(&catalog(), &working);
        let row = &rows[2];
        assert!(row.is_modified);
        assert_eq!(row.cost_price, Money::from_rupees(5000));
        assert_eq!(row.snapshot_cost_price, Money::from_rupees(3850));
        assert_eq!(row.pricing.base_selling_price, Money::from_rupees(6750));
        assert!(row.validation.has_code(IssueCode::PriceJump));
    }

    #[test]
    fn test_is_modified_iff_override_differs() {
        let snapshot = catalog();
        let cases = [
            (WorkingItemState::default(), false),
            (
                WorkingItemState {
                    cost_price: Some(Money::from_rupees(1000)),
                    stock_quantity: Some(100),
                },
                false,
            ),
            (
                WorkingItemState {
                    cost_price: Some(Money::from_rupees(1001)),
                    stock_quantity: None,
                },
                true,
            ),
            (
                WorkingItemState {
                    cost_price: None,
                    stock_quantity: Some(99),
                },
                true,
            ),
        ];

        for (state, expected) in cases {
            let mut working = WorkingSet::new();
            working.insert("ITEM-001", state);
            let rows = build_rows(&snapshot, &working);
            assert_eq!(rows[0].is_modified, expected, "state {:?}", state);
            assert!(!rows[1].is_modified);
        }
    }

    #[test]
    fn test_stock_override_changes_markup() {
        let mut working = WorkingSet::new();
        working.set_stock("ITEM-001", 0);
        let rows = build_rows(&catalog(), &working);
        assert_eq!(rows[0].pricing.markup_bps, 4000);
        assert_eq!(rows[0].pricing.base_selling_price, Money::from_rupees(1400));
    }

    #[test]
    fn test_rows_follow_snapshot_order() {
        let mut snapshot = catalog();
        snapshot.reverse();
        let rows = build_rows(&snapshot, &WorkingSet::new());
        let codes: Vec<_> = rows.iter().map(|r| r.item_code.as_str()).collect();
        assert_eq!(codes, vec!["ITEM-003", "ITEM-002", "ITEM-001"]);
    }

    #[test]
    fn test_orphaned_edits_are_surfaced_not_rowed() {
        let mut working = WorkingSet::new();
        working.set_cost("ITEM-001", Money::from_rupees(1100));
        working.set_cost("GONE-9", Money::from_rupees(1));
        working.set_stock("GONE-1", 3);

        let view = DiffBuilder::default().build_console(&catalog(), &working);
        assert_eq!(view.rows.len(), 3);
        assert!(view.rows.iter().all(|r| !r.item_code.starts_with("GONE")));
        assert_eq!(view.orphaned_item_codes, vec!["GONE-1", "GONE-9"]);
    }

    #[test]
    fn test_change_summary_only_carries_changed_fields() {
        let mut working = WorkingSet::new();
        working.set_cost("ITEM-002", Money::from_rupees(840));
        working.set_stock("ITEM-002", 100);

        let rows = build_rows(&catalog(), &working);
        let change = rows[1].change_summary().unwrap();
        assert_eq!(change.item_code, "ITEM-002");
        assert_eq!(change.new_cost_price, Some(Money::from_rupees(840)));
        assert_eq!(change.new_stock_quantity, None);
        assert_eq!(change.new_base_selling_price, Money::from_rupees(1050));
        assert_eq!(change.previous_base_selling_price, Some(Money::from_rupees(1000)));
        assert!(rows[0].change_summary().is_none());
    }

    #[test]
    fn test_collect_changes_blocks_on_errors() {
        let mut working = WorkingSet::new();
        working.set_cost("ITEM-001", Money::from_paise(-1));
        working.set_cost("ITEM-002", Money::from_rupees(840));

        let rows = build_rows(&catalog(), &working);
        let err = collect_changes(&rows).unwrap_err();
        match err {
            CoreError::SyncBlocked { item_codes } => assert_eq!(item_codes, vec!["ITEM-001"]),
            other => panic!("unexpected error: {other}"),
        }

        working.discard("ITEM-001");
        let rows = build_rows(&catalog(), &working);
        let changes = collect_changes(&rows).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].item_code, "ITEM-002");
    }

    #[test]
    fn test_unmodified_blocked_row_does_not_block() {
        // ITEM-X has a blocking jump in the snapshot itself but is not edited
        let mut snapshot = catalog();
        snapshot.push(item("ITEM-X", 1000, GstRate::Eighteen, Some(100)));
        let mut working = WorkingSet::new();
        working.set_stock("ITEM-002", 7);

        let rows = build_rows(&snapshot, &working);
        assert!(rows[3].is_blocked());
        assert_eq!(collect_changes(&rows).unwrap().len(), 1);
    }

    #[test]
    fn test_summary_counts() {
        let mut snapshot = catalog();
        snapshot.push(item("ITEM-004", 100, GstRate::Five, None));
        let mut working = WorkingSet::new();
        working.set_cost("ITEM-003", Money::from_rupees(5000));
        working.set_cost("ITEM-004", Money::from_paise(-10));

        let view = DiffBuilder::default().build_console(&snapshot, &working);
        assert_eq!(
            view.summary(),
            ConsoleSummary {
                total: 4,
                modified: 2,
                blocked: 1,
                with_warnings: 1,
            }
        );
    }

    #[test]
    fn test_row_json_shape() {
        let rows = build_rows(&catalog(), &WorkingSet::new());
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["item_code"], "ITEM-001");
        assert_eq!(json["gst_rate"], 0.18);
        assert_eq!(json["pricing"]["base_selling_price"], 135000);
        assert_eq!(json["validation"]["ok"], true);
        assert_eq!(json["is_modified"], false);
    }
}

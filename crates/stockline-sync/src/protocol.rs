//! # ERP Wire Protocol
//!
//! Request and response shapes exchanged with the ERP price endpoints.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ERP REST Endpoints                                │
//! │                                                                         │
//! │  CONNECTIVITY PROBE                                                    │
//! │  ──────────────────                                                    │
//! │  console ───► GET  {ping_path}                 (no side effects)       │
//! │  ERP     ◄─── 2xx                                                      │
//! │                                                                         │
//! │  SNAPSHOT                                                              │
//! │  ────────                                                              │
//! │  console ───► GET  {items_path}                                        │
//! │  ERP     ◄─── { data: [ErpItem, ...] }   or a bare array               │
//! │                                                                         │
//! │  BATCH PRICE UPDATE                                                    │
//! │  ──────────────────                                                    │
//! │  console ───► POST {batch_path} BatchUpdateRequest                     │
//! │  ERP     ◄─── BatchUpdateResponse { success, failed: [...] }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Amounts
//! The ERP speaks rupees as JSON numbers. Inside the console every amount is
//! [`Money`] in paise; conversion happens only here, once per direction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockline_core::validation::validate_item_code;
use stockline_core::{ChangeSummaryRow, CoreError, CoreResult, GstRate, ItemSnapshot, Money};

// =============================================================================
// Batch Update Request
// =============================================================================

/// Versions stamped onto every batch so ERP history can be traced back to
/// the formula and console build that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMeta {
    pub engine_version: String,
    pub console_version: String,
}

/// One price change as the ERP receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpChange {
    pub item_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cost_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_stock_quantity: Option<i64>,

    pub new_base_selling_price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_base_selling_price: Option<f64>,
}

impl From<&ChangeSummaryRow> for ErpChange {
    fn from(row: &ChangeSummaryRow) -> Self {
        ErpChange {
            item_code: row.item_code.clone(),
            new_cost_price: row.new_cost_price.map(|m| m.to_rupees_f64()),
            new_stock_quantity: row.new_stock_quantity,
            new_base_selling_price: row.new_base_selling_price.to_rupees_f64(),
            previous_base_selling_price: row.previous_base_selling_price.map(|m| m.to_rupees_f64()),
        }
    }
}

/// Body of the batch price update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    pub sync_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    pub changes: Vec<ErpChange>,

    pub meta: SyncMeta,
}

impl BatchUpdateRequest {
    pub fn new(
        sync_id: Uuid,
        reason: Option<String>,
        changes: &[ChangeSummaryRow],
        meta: SyncMeta,
    ) -> Self {
        BatchUpdateRequest {
            sync_id,
            reason,
            changes: changes.iter().map(ErpChange::from).collect(),
            meta,
        }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

// =============================================================================
// Batch Update Response
// =============================================================================

/// An item the ERP refused to update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item_code: String,

    /// The ERP calls this field `error`.
    #[serde(alias = "error")]
    pub reason: String,
}

/// Raw response of the batch endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchUpdateResponse {
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    /// Free-form; ERP versions send either a string or an object.
    #[serde(default)]
    pub details: Option<serde_json::Value>,

    #[serde(default)]
    pub applied: Option<usize>,

    #[serde(default)]
    pub failed: Option<Vec<ItemFailure>>,
}

impl BatchUpdateResponse {
    /// Details flattened to display text.
    pub fn details_text(&self) -> Option<String> {
        match &self.details {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// What a successful batch call reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchUpdateReport {
    /// Items the ERP applied.
    pub applied: usize,

    /// Items the ERP refused even though the call as a whole succeeded.
    pub failures: Vec<ItemFailure>,
}

impl BatchUpdateReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Snapshot Items
// =============================================================================

/// One row of the ERP items endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpItem {
    pub item_code: String,
    pub item_name: String,

    /// Rupees.
    pub cost_price: f64,

    /// ERP stock ledgers use floats even for whole units.
    pub stock_quantity: f64,

    /// Fraction, `0.05` or `0.18`.
    pub gst_rate: f64,

    /// Rupees, ex-GST.
    #[serde(default)]
    pub previous_base_selling_price: Option<f64>,
}

impl ErpItem {
    /// Converts to the console's snapshot type, rejecting anything that
    /// would silently change a number.
    pub fn into_snapshot(self) -> CoreResult<ItemSnapshot> {
        validate_item_code(&self.item_code)?;

        let cost_price = rupees(&self.item_code, "cost_price", self.cost_price)?;
        let previous_base_selling_price = self
            .previous_base_selling_price
            .map(|p| rupees(&self.item_code, "previous_base_selling_price", p))
            .transpose()?;

        if !self.stock_quantity.is_finite() || self.stock_quantity.fract() != 0.0 {
            return Err(CoreError::InvalidAmount {
                item_code: self.item_code,
                field: "stock_quantity".to_string(),
                reason: format!("{} is not a whole number", self.stock_quantity),
            });
        }
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
        if self.stock_quantity < i64::MIN as f64 || self.stock_quantity >= i64::MAX as f64 {
            return Err(CoreError::InvalidAmount {
                item_code: self.item_code,
                field: "stock_quantity".to_string(),
                reason: format!("{} is out of range", self.stock_quantity),
            });
        }

        let gst_rate = GstRate::for_item(&self.item_code, self.gst_rate)?;

        Ok(ItemSnapshot {
            item_code: self.item_code,
            item_name: self.item_name,
            cost_price,
            stock_quantity: self.stock_quantity as i64,
            gst_rate,
            previous_base_selling_price,
        })
    }
}

fn rupees(item_code: &str, field: &str, value: f64) -> CoreResult<Money> {
    Money::from_rupees_f64(value).ok_or_else(|| CoreError::InvalidAmount {
        item_code: item_code.to_string(),
        field: field.to_string(),
        reason: format!("{} is not a representable rupee amount", value),
    })
}

/// The items endpoint answers either `{ "data": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemsEnvelope {
    Wrapped { data: Vec<ErpItem> },
    Bare(Vec<ErpItem>),
}

impl ItemsEnvelope {
    pub fn into_items(self) -> Vec<ErpItem> {
        match self {
            ItemsEnvelope::Wrapped { data } => data,
            ItemsEnvelope::Bare(items) => items,
        }
    }
}

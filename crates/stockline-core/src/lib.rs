//! # stockline-core: Pure Pricing Logic for the Stockline Console
//!
//! Everything the pricing console computes lives here as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stockline Console Pipeline                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    ERP snapshot (stockline-sync)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Vec<ItemSnapshot>                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │ validation│  │   diff    │  │   │
//! │  │   │ Snapshot  │  │ RateCard  │  │ guardrails│  │ ConsoleRow│  │   │
//! │  │   │ WorkingSet│  │ Derived   │  │ Severity  │  │ changes   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Vec<ChangeSummaryRow>                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               Sync Controller (stockline-sync)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Snapshot, working state, change rows, GST slabs
//! - [`money`] - Money type in integer paise
//! - [`pricing`] - Pricing engine and rate card
//! - [`validation`] - Price guardrails and input validators
//! - [`diff`] - Snapshot/working diff into console rows
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockline_core::{build_rows, collect_changes, GstRate, ItemSnapshot, Money, WorkingSet};
//!
//! let snapshot = vec![ItemSnapshot {
//!     item_code: "ITEM-001".into(),
//!     item_name: "Toor Dal 30kg".into(),
//!     cost_price: Money::from_rupees(1000),
//!     stock_quantity: 100,
//!     gst_rate: GstRate::Eighteen,
//!     previous_base_selling_price: Some(Money::from_rupees(1350)),
//! }];
//!
//! let mut working = WorkingSet::new();
//! working.set_cost("ITEM-001", Money::from_rupees(1100));
//!
//! let rows = build_rows(&snapshot, &working);
//! assert!(rows[0].is_modified);
//! assert_eq!(rows[0].pricing.base_selling_price, Money::from_rupees(1485));
//!
//! let changes = collect_changes(&rows).unwrap();
//! assert_eq!(changes.len(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod diff;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use diff::{build_rows, collect_changes, orphaned_edits, ConsoleRow, ConsoleSummary, ConsoleView, DiffBuilder};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{derive_pricing, DerivedPricing, PricingInputs, RateCard, ENGINE_VERSION};
pub use types::*;
pub use validation::{validate, IssueCode, Severity, ValidationIssue, ValidationPolicy, ValidationResult};

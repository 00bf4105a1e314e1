//! # Validation Module
//!
//! Price guardrails for the console grid, plus input validators used before
//! anything is sent to the ERP.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Price guardrails (validate)                                  │
//! │  ├── Advisory: issues are DATA, rendered inline per row                │
//! │  └── Error-severity issues block the row from being synced             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Input validators (validate_item_code, ...)                   │
//! │  ├── Reject malformed sync payloads before any network call            │
//! │  └── Return ValidationError                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: ERP                                                          │
//! │  └── Per-item rejections reported back by the batch endpoint           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Severity Policy
//! ```text
//!   Info     → shown, never blocks           (no_baseline)
//!   Warning  → shown, never blocks           (price_jump > warn, negative_stock)
//!   Error    → shown, BLOCKS sync of the row (negative_cost, non_positive_margin,
//!                                             price_jump > block)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{DerivedPricing, PricingInputs};

/// Result type for input validators.
pub type InputResult<T> = Result<T, ValidationError>;

/// Longest item code the ERP accepts.
pub const MAX_ITEM_CODE_LEN: usize = 64;

// =============================================================================
// Policy
// =============================================================================

/// Thresholds for the price-jump check, in basis points of the previous
/// price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Above this the row gets a Warning.
    pub warn_jump_bps: i64,

    /// Above this the row gets an Error and cannot be synced.
    pub block_jump_bps: i64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            warn_jump_bps: 2000,
            block_jump_bps: 5000,
        }
    }
}

impl ValidationPolicy {
    /// Checks the thresholds make sense together.
    pub fn check(&self) -> InputResult<()> {
        if self.warn_jump_bps < 0 {
            return Err(ValidationError::OutOfRange {
                field: "warn_jump_bps".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if self.block_jump_bps < self.warn_jump_bps {
            return Err(ValidationError::OutOfRange {
                field: "block_jump_bps".to_string(),
                min: self.warn_jump_bps,
                max: i64::MAX,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Issues
// =============================================================================

/// How serious an issue is. Ordered: `Info < Warning < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Machine-readable issue kind, so the frontend can pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    NegativeCost,
    NegativeStock,
    NonPositiveMargin,
    NoBaseline,
    PriceJump,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
}

/// Outcome of validating one row. `ok` is false iff an Error issue exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationResult {
    pub ok: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let ok = !issues.iter().any(|i| i.severity == Severity::Error);
        ValidationResult { ok, issues }
    }

    /// True if the row must not be synced.
    pub fn is_blocking(&self) -> bool {
        !self.ok
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

// =============================================================================
// Price Guardrails
// =============================================================================

/// Validates a proposed price against the previous one and the row inputs.
///
/// Never fails: malformed inputs are reported as issues. Checks run in a
/// fixed order so the issue list is stable.
///
/// ```rust
/// use stockline_core::money::Money;
/// use stockline_core::pricing::{derive_pricing, PricingInputs};
/// use stockline_core::types::GstRate;
/// use stockline_core::validation::{validate, IssueCode, ValidationPolicy};
///
/// let inputs = PricingInputs {
///     cost_price: Money::from_rupees(5000),
///     gst_rate: GstRate::Eighteen,
///     stock_quantity: 20,
/// };
/// let proposed = derive_pricing(inputs.cost_price, inputs.gst_rate, inputs.stock_quantity);
/// let result = validate(Some(Money::from_rupees(5200)), &proposed, &inputs, &ValidationPolicy::default());
/// assert!(result.has_code(IssueCode::PriceJump));
/// ```
pub fn validate(
    previous_price: Option<Money>,
    proposed: &DerivedPricing,
    inputs: &PricingInputs,
    policy: &ValidationPolicy,
) -> ValidationResult {
    let mut issues = Vec::new();

    if inputs.cost_price.is_negative() {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            code: IssueCode::NegativeCost,
            message: format!("Cost price {} is negative", inputs.cost_price),
        });
    }

    if inputs.stock_quantity < 0 {
        issues.push(ValidationIssue {
            severity: Severity::Warning,
            code: IssueCode::NegativeStock,
            message: format!("Stock quantity {} is negative", inputs.stock_quantity),
        });
    }

    if proposed.base_selling_price <= inputs.cost_price {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            code: IssueCode::NonPositiveMargin,
            message: format!(
                "Selling price {} does not exceed cost {}",
                proposed.base_selling_price, inputs.cost_price
            ),
        });
    }

    match previous_price.and_then(|prev| {
        proposed
            .base_selling_price
            .change_bps_from(prev)
            .map(|bps| (prev, bps))
    }) {
        None => issues.push(ValidationIssue {
            severity: Severity::Info,
            code: IssueCode::NoBaseline,
            message: "No previous selling price; jump check skipped".to_string(),
        }),
        Some((prev, change_bps)) => {
            let severity = if change_bps > policy.block_jump_bps {
                Some(Severity::Error)
            } else if change_bps > policy.warn_jump_bps {
                Some(Severity::Warning)
            } else {
                None
            };

            if let Some(severity) = severity {
                issues.push(ValidationIssue {
                    severity,
                    code: IssueCode::PriceJump,
                    message: format!(
                        "Price moves {}.{:02}% ({} → {})",
                        change_bps / 100,
                        change_bps % 100,
                        prev,
                        proposed.base_selling_price
                    ),
                });
            }
        }
    }

    ValidationResult::from_issues(issues)
}

// =============================================================================
// Input Validators
// =============================================================================

/// Validates an ERP item code.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most [`MAX_ITEM_CODE_LEN`] characters
/// - Letters, digits, `-`, `_`, `.` and `/` only
///
/// ```rust
/// use stockline_core::validation::validate_item_code;
///
/// assert!(validate_item_code("ITEM-001").is_ok());
/// assert!(validate_item_code("RICE/25KG").is_ok());
/// assert!(validate_item_code("").is_err());
/// assert!(validate_item_code("has space").is_err());
/// ```
pub fn validate_item_code(item_code: &str) -> InputResult<()> {
    if item_code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item_code".to_string(),
        });
    }

    if item_code.len() > MAX_ITEM_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "item_code".to_string(),
            max: MAX_ITEM_CODE_LEN,
        });
    }

    if !item_code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "item_code".to_string(),
            reason: "must contain only letters, numbers, '-', '_', '.' and '/'".to_string(),
        });
    }

    Ok(())
}

/// Validates a cost price entered for sync. Zero is allowed (free samples).
pub fn validate_cost_price(cost: Money) -> InputResult<()> {
    if cost.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "cost_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::derive_pricing;
    use crate::types::GstRate;

    fn inputs(cost_rupees: i64, stock: i64) -> PricingInputs {
        PricingInputs {
            cost_price: Money::from_rupees(cost_rupees),
            gst_rate: GstRate::Eighteen,
            stock_quantity: stock,
        }
    }

    fn run(previous: Option<Money>, inputs: &PricingInputs) -> ValidationResult {
        let proposed = derive_pricing(inputs.cost_price, inputs.gst_rate, inputs.stock_quantity);
        validate(previous, &proposed, inputs, &ValidationPolicy::default())
    }

    #[test]
    fn test_within_tolerance_is_clean() {
        let i = inputs(1000, 100);
        let result = run(Some(Money::from_rupees(1350)), &i);
        assert!(result.ok);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_warn_level_jump() {
        // 5000 × 1.35 = 6750 vs 5200 → +29.81%
        let result = run(Some(Money::from_rupees(5200)), &inputs(5000, 100));
        assert!(result.ok);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].code, IssueCode::PriceJump);
        assert_eq!(result.issues[0].severity, Severity::Warning);
        assert!(result.issues[0].message.contains("29.81%"));
    }

    #[test]
    fn test_block_level_jump() {
        // 1350 vs 500 → +170%
        let result = run(Some(Money::from_rupees(500)), &inputs(1000, 100));
        assert!(!result.ok);
        assert!(result.is_blocking());
        assert_eq!(result.max_severity(), Some(Severity::Error));
    }

    #[test]
    fn test_price_drop_counts_as_jump() {
        // 1350 vs 2000 → −32.5%
        let result = run(Some(Money::from_rupees(2000)), &inputs(1000, 100));
        assert!(result.has_code(IssueCode::PriceJump));
        assert!(result.ok);
    }

    #[test]
    fn test_missing_or_malformed_baseline_skips_jump_check() {
        for previous in [None, Some(Money::zero()), Some(Money::from_paise(-100))] {
            let result = run(previous, &inputs(1000, 100));
            assert!(result.ok);
            assert_eq!(result.issues.len(), 1);
            assert_eq!(result.issues[0].code, IssueCode::NoBaseline);
            assert_eq!(result.issues[0].severity, Severity::Info);
        }
    }

    #[test]
    fn test_zero_cost_has_no_margin() {
        let result = run(Some(Money::from_rupees(10)), &inputs(0, 5));
        assert!(result.has_code(IssueCode::NonPositiveMargin));
        assert!(!result.ok);
    }

    #[test]
    fn test_negative_inputs_are_issues_not_panics() {
        let i = PricingInputs {
            cost_price: Money::from_paise(-500),
            gst_rate: GstRate::Five,
            stock_quantity: -2,
        };
        let result = run(Some(Money::from_rupees(10)), &i);
        assert!(!result.ok);
        assert!(result.has_code(IssueCode::NegativeCost));
        assert!(result.has_code(IssueCode::NegativeStock));
        assert_eq!(result.issues[0].code, IssueCode::NegativeCost);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let i = inputs(5000, 100);
        let proposed = derive_pricing(i.cost_price, i.gst_rate, i.stock_quantity);
        let policy = ValidationPolicy::default();
        let prev = Some(Money::from_rupees(5200));
        assert_eq!(
            validate(prev, &proposed, &i, &policy),
            validate(prev, &proposed, &i, &policy)
        );
    }

    #[test]
    fn test_custom_policy() {
        let strict = ValidationPolicy {
            warn_jump_bps: 100,
            block_jump_bps: 1000,
        };
        let i = inputs(5000, 100);
        let proposed = derive_pricing(i.cost_price, i.gst_rate, i.stock_quantity);
        let result = validate(Some(Money::from_rupees(5200)), &proposed, &i, &strict);
        assert!(result.is_blocking());
    }

    #[test]
    fn test_policy_check() {
        assert!(ValidationPolicy::default().check().is_ok());
        let inverted = ValidationPolicy {
            warn_jump_bps: 3000,
            block_jump_bps: 1000,
        };
        assert!(inverted.check().is_err());
    }

    #[test]
    fn test_validate_item_code() {
        assert!(validate_item_code("ITEM-001").is_ok());
        assert!(validate_item_code("sku_1.v2").is_ok());
        assert!(validate_item_code("   ").is_err());
        assert!(validate_item_code("ITEM 001").is_err());
        assert!(validate_item_code(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_cost_price() {
        assert!(validate_cost_price(Money::zero()).is_ok());
        assert!(validate_cost_price(Money::from_paise(-1)).is_err());
    }
}

//! # Error Types
//!
//! Domain-specific error types for stockline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockline-core errors (this file)                                     │
//! │  ├── CoreError        - Data-quality and sync-gating failures          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockline-sync errors (separate crate)                                │
//! │  └── SyncError        - Config, ERP transport, remote rejection        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → SyncResult (caller)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing advisories (price jumps, thin margins) are NOT errors: they are
//! data in [`crate::validation::ValidationResult`] so the console can render
//! them inline.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A GST rate outside the two supported slabs.
    ///
    /// ## When This Occurs
    /// - ERP item carries a 12% or 28% tax template
    /// - Fixture file typo (`0.018` instead of `0.18`)
    ///
    /// Rejected, never rounded to the nearest slab.
    #[error("Unsupported GST rate {rate} for item {item_code}: expected 0.05 or 0.18")]
    UnsupportedGstRate { item_code: String, rate: String },

    /// The same item code appears twice in one snapshot.
    #[error("Duplicate item code in snapshot: {0}")]
    DuplicateItemCode(String),

    /// A price field from the snapshot source could not be represented.
    #[error("Invalid {field} for item {item_code}: {reason}")]
    InvalidAmount {
        item_code: String,
        field: String,
        reason: String,
    },

    /// Modified rows carry error-level validation issues.
    ///
    /// ## User Workflow
    /// ```text
    /// Select changed rows ──► collect_changes()
    ///                              │
    ///                              ├── any row with Error issue?
    ///                              │        │
    ///                              │        ▼
    ///                              │   SyncBlocked { ITEM-003, ... }
    ///                              │   UI highlights those rows
    ///                              │
    ///                              └── OK → payload handed to the controller
    /// ```
    #[error("Sync blocked by validation errors on: {}", item_codes.join(", "))]
    SyncBlocked { item_codes: Vec<String> },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnsupportedGstRate {
            item_code: "ITEM-009".to_string(),
            rate: "0.12".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported GST rate 0.12 for item ITEM-009: expected 0.05 or 0.18"
        );

        let err = CoreError::SyncBlocked {
            item_codes: vec!["ITEM-001".into(), "ITEM-003".into()],
        };
        assert_eq!(
            err.to_string(),
            "Sync blocked by validation errors on: ITEM-001, ITEM-003"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "item_code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

//! # Sync Error Types
//!
//! Error types for snapshot loading, ERP calls and notifications.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Input       │  │     Transport           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  EmptyBatch     │  │  CouldNotConnect        │ │
//! │  │  InvalidUrl     │  │  InvalidChange  │  │  ErpUnavailable         │ │
//! │  │  ConfigLoad...  │  │  DuplicateChange│  │  Http                   │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Remote       │  │    Snapshot     │  │      Internal           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  ErpStatus      │  │  DataQuality    │  │  NotifyFailed           │ │
//! │  │  ErpRejected    │  │  FixtureLoad... │  │  SyncInFlight           │ │
//! │  │  InvalidResponse│  │                 │  │  Internal               │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use stockline_core::{CoreError, ValidationError};

use crate::protocol::ItemFailure;

/// Result type alias for sync-layer operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Sync error type covering every failure the I/O layer can see.
///
/// The controller folds these into a `SyncFailureKind` so callers never
/// have to match on the full enum.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid console configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configured URL does not parse or has the wrong scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// The change list is empty.
    #[error("Nothing to sync: the change list is empty")]
    EmptyBatch,

    /// A change row is malformed.
    #[error("Invalid change for item {item_code}: {reason}")]
    InvalidChange { item_code: String, reason: String },

    /// The same item appears twice in one batch.
    #[error("Item {0} appears more than once in the batch")]
    DuplicateChange(String),

    /// Another sync is already running on this controller.
    #[error("A sync is already in progress")]
    SyncInFlight,

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Connection refused, DNS failure or timeout.
    #[error("Could not connect to ERP: {0}")]
    CouldNotConnect(String),

    /// The ERP (or a proxy in front of it) answered 502/503/504.
    #[error("Could not connect to ERP: service unavailable (HTTP {status})")]
    ErpUnavailable { status: u16 },

    /// Any other transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// Non-2xx status other than gateway errors.
    #[error("ERP returned HTTP {status}: {body}")]
    ErpStatus { status: u16, body: String },

    /// The ERP answered `success: false`.
    #[error("ERP rejected the batch: {message}")]
    ErpRejected {
        message: String,
        details: Option<String>,
        failed: Vec<ItemFailure>,
    },

    /// Response body is not the shape we expect.
    #[error("Invalid ERP response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Snapshot Errors
    // =========================================================================
    /// The snapshot source returned data that breaks a domain rule.
    #[error("Snapshot rejected: {0}")]
    DataQuality(String),

    /// Fixture file missing or unreadable.
    #[error("Failed to load fixture: {0}")]
    FixtureLoadFailed(String),

    // =========================================================================
    // Notification & Internal Errors
    // =========================================================================
    /// Chat notification could not be delivered.
    #[error("Notification failed: {0}")]
    NotifyFailed(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SyncError::CouldNotConnect(err.to_string())
        } else if err.is_decode() {
            SyncError::InvalidResponse(err.to_string())
        } else {
            SyncError::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<CoreError> for SyncError {
    fn from(err: CoreError) -> Self {
        SyncError::DataQuality(err.to_string())
    }
}

impl From<ValidationError> for SyncError {
    fn from(err: ValidationError) -> Self {
        SyncError::InvalidConfig(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the same request could succeed if sent again later.
    ///
    /// Nothing retries automatically; this picks the retry hint carried in
    /// `SyncResult::details`.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::CouldNotConnect(_)
                | SyncError::ErpUnavailable { .. }
                | SyncError::Http(_)
                | SyncError::SyncInFlight
        )
    }

    /// Returns true if the ERP could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            SyncError::CouldNotConnect(_) | SyncError::ErpUnavailable { .. }
        )
    }

    /// Returns true if the caller sent something we refuse before any I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SyncError::EmptyBatch
                | SyncError::InvalidChange { .. }
                | SyncError::DuplicateChange(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
        )
    }

    /// Per-item failures carried by the error, if any.
    pub fn failed_items(&self) -> &[ItemFailure] {
        match self {
            SyncError::ErpRejected { failed, .. } => failed,
            _ => &[],
        }
    }
}

//! # Sync Controller
//!
//! Turns a list of committed changes into exactly one ERP batch call and a
//! [`SyncResult`] verdict.
//!
//! ## Attempt Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Sync Attempt                                  │
//! │                                                                         │
//! │   Idle ──► Starting ──► InFlight ──► Succeeded                         │
//! │               │            │                                            │
//! │               │            └───────► Failed                            │
//! │               └────────────────────► Failed   (input / busy)           │
//! │                                                                         │
//! │  Starting   fresh sync_id, input checks, in-flight guard               │
//! │             (no network: nothing leaves the process on rejection)       │
//! │  InFlight   "started" notice → ping → POST batch                       │
//! │  Terminal   exactly one "succeeded" or "failed" notice                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Every attempt gets a new UUID v4 `sync_id`, also on failure.
//! - Errors never cross the controller boundary; everything becomes data in
//!   the returned [`SyncResult`].
//! - Notifications are bounded by `notify_timeout`; their failures are
//!   logged and never alter the verdict.
//! - At most one attempt runs per controller. A second concurrent call is
//!   refused with [`SyncFailureKind::Busy`], not queued.
//! - No automatic retry. The caller decides whether to resubmit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use stockline_core::validation::{validate_cost_price, validate_item_code};
use stockline_core::{ChangeSummaryRow, ENGINE_VERSION};

use crate::config::{ConsoleConfig, CONSOLE_VERSION};
use crate::erp::BatchUpdateExecutor;
use crate::error::{Result, SyncError};
use crate::notify::SyncNotifier;
use crate::protocol::{BatchUpdateReport, BatchUpdateRequest, ItemFailure, SyncMeta};

// =============================================================================
// Settings
// =============================================================================

/// Values the controller stamps on payloads and uses as bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub engine_version: String,
    pub console_version: String,
    pub notify_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            engine_version: ENGINE_VERSION.to_string(),
            console_version: CONSOLE_VERSION.to_string(),
            notify_timeout: Duration::from_secs(5),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &ConsoleConfig) -> Self {
        ControllerSettings {
            engine_version: ENGINE_VERSION.to_string(),
            console_version: config.console.console_version.clone(),
            notify_timeout: config.notify.timeout(),
        }
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Coarse failure category for callers that branch on outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFailureKind {
    /// Rejected before any network call.
    InvalidInput,
    /// Another attempt is in flight on this controller.
    Busy,
    /// ERP unreachable.
    Connectivity,
    /// ERP answered and refused some or all items.
    RemoteRejection,
    /// ERP answered with an error status or garbage.
    RemoteError,
    Internal,
}

impl SyncFailureKind {
    pub fn of(err: &SyncError) -> Self {
        match err {
            e if e.is_input_error() => SyncFailureKind::InvalidInput,
            SyncError::SyncInFlight => SyncFailureKind::Busy,
            e if e.is_connectivity() => SyncFailureKind::Connectivity,
            SyncError::ErpRejected { .. } => SyncFailureKind::RemoteRejection,
            SyncError::ErpStatus { .. } | SyncError::InvalidResponse(_) | SyncError::Http(_) => {
                SyncFailureKind::RemoteError
            }
            _ => SyncFailureKind::Internal,
        }
    }
}

/// Verdict of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub sync_id: Uuid,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<SyncFailureKind>,

    /// Items the ERP refused. Empty on success and on non-item failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_items: Vec<ItemFailure>,

    /// Items the ERP reported as applied.
    #[serde(default)]
    pub applied: usize,

    pub completed_at: DateTime<Utc>,
}

impl SyncResult {
    fn succeeded(sync_id: Uuid, report: &BatchUpdateReport) -> Self {
        SyncResult {
            success: true,
            sync_id,
            message: format!("Synced {} item(s) to ERP", report.applied),
            details: None,
            failure: None,
            failed_items: Vec::new(),
            applied: report.applied,
            completed_at: Utc::now(),
        }
    }

    fn failed(sync_id: Uuid, err: &SyncError) -> Self {
        let failed_items = err.failed_items().to_vec();
        let details = match err {
            SyncError::ErpRejected { details, .. } => details.clone(),
            _ => None,
        };

        SyncResult {
            success: false,
            sync_id,
            message: err.to_string(),
            details: details.or_else(|| failure_hint(err)),
            failure: Some(SyncFailureKind::of(err)),
            failed_items,
            applied: 0,
            completed_at: Utc::now(),
        }
    }

    fn partially_rejected(sync_id: Uuid, report: BatchUpdateReport) -> Self {
        SyncResult {
            success: false,
            sync_id,
            message: format!(
                "ERP rejected {} item(s); {} applied",
                report.failures.len(),
                report.applied
            ),
            details: None,
            failure: Some(SyncFailureKind::RemoteRejection),
            failed_items: report.failures,
            applied: report.applied,
            completed_at: Utc::now(),
        }
    }

    /// Codes of the items the ERP refused.
    pub fn failed_item_codes(&self) -> impl Iterator<Item = &str> {
        self.failed_items.iter().map(|f| f.item_code.as_str())
    }
}

fn failure_hint(err: &SyncError) -> Option<String> {
    match err {
        e if e.is_connectivity() => Some(
            "Could not connect to ERP. Check the network and the ERP status, then retry.".into(),
        ),
        SyncError::SyncInFlight => Some("Wait for the running sync to finish.".into()),
        e if e.is_retryable() => Some("The request did not complete. Retry the sync.".into()),
        _ => None,
    }
}

// =============================================================================
// Attempt State Machine
// =============================================================================

/// Phase of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Starting,
    InFlight,
    Succeeded,
    Failed,
}

impl SyncPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Succeeded | SyncPhase::Failed)
    }

    pub fn can_advance_to(&self, next: SyncPhase) -> bool {
        matches!(
            (self, next),
            (SyncPhase::Idle, SyncPhase::Starting)
                | (SyncPhase::Starting, SyncPhase::InFlight)
                | (SyncPhase::Starting, SyncPhase::Failed)
                | (SyncPhase::InFlight, SyncPhase::Succeeded)
                | (SyncPhase::InFlight, SyncPhase::Failed)
        )
    }
}

#[derive(Debug)]
struct SyncAttempt {
    sync_id: Uuid,
    phase: SyncPhase,
}

impl SyncAttempt {
    fn new() -> Self {
        SyncAttempt {
            sync_id: Uuid::new_v4(),
            phase: SyncPhase::Idle,
        }
    }

    fn advance(&mut self, next: SyncPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal sync transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(sync_id = %self.sync_id, from = ?self.phase, to = ?next, "Sync phase");
        self.phase = next;
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Orchestrates one sync attempt at a time.
pub struct SyncController {
    executor: Arc<dyn BatchUpdateExecutor>,
    notifier: Arc<dyn SyncNotifier>,
    settings: ControllerSettings,
    in_flight: Mutex<()>,
}

impl SyncController {
    pub fn new(
        executor: Arc<dyn BatchUpdateExecutor>,
        notifier: Arc<dyn SyncNotifier>,
        settings: ControllerSettings,
    ) -> Self {
        SyncController {
            executor,
            notifier,
            settings,
            in_flight: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// True while an attempt holds the in-flight guard.
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Runs one sync attempt. Never returns an error: every outcome is a
    /// [`SyncResult`].
    pub async fn execute_sync(&self, changes: &[ChangeSummaryRow], reason: Option<&str>) -> SyncResult {
        let mut attempt = SyncAttempt::new();
        attempt.advance(SyncPhase::Starting);
        let sync_id = attempt.sync_id;

        if let Err(err) = check_changes(changes) {
            warn!(sync_id = %sync_id, error = %err, "Sync rejected before sending");
            attempt.advance(SyncPhase::Failed);
            return SyncResult::failed(sync_id, &err);
        }

        let _guard = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(sync_id = %sync_id, "Sync refused: another sync is in flight");
                attempt.advance(SyncPhase::Failed);
                return SyncResult::failed(sync_id, &SyncError::SyncInFlight);
            }
        };

        let count = changes.len();
        info!(sync_id = %sync_id, count, reason = reason.unwrap_or(""), "Starting price sync");

        self.best_effort("start", sync_id, self.notifier.notify_sync_start(count, sync_id))
            .await;

        attempt.advance(SyncPhase::InFlight);

        match self.send(sync_id, changes, reason).await {
            Ok(report) if report.is_complete() => {
                info!(sync_id = %sync_id, applied = report.applied, "Price sync succeeded");
                self.best_effort("success", sync_id, self.notifier.notify_sync_success(sync_id, count))
                    .await;
                attempt.advance(SyncPhase::Succeeded);
                SyncResult::succeeded(sync_id, &report)
            }
            Ok(report) => {
                let result = SyncResult::partially_rejected(sync_id, report);
                warn!(
                    sync_id = %sync_id,
                    rejected = result.failed_items.len(),
                    applied = result.applied,
                    "Price sync partially rejected"
                );
                self.best_effort("fail", sync_id, self.notifier.notify_sync_fail(sync_id, &result.message))
                    .await;
                attempt.advance(SyncPhase::Failed);
                result
            }
            Err(err) => {
                error!(sync_id = %sync_id, error = %err, "Price sync failed");
                let message = err.to_string();
                self.best_effort("fail", sync_id, self.notifier.notify_sync_fail(sync_id, &message))
                    .await;
                attempt.advance(SyncPhase::Failed);
                SyncResult::failed(sync_id, &err)
            }
        }
    }

    async fn send(
        &self,
        sync_id: Uuid,
        changes: &[ChangeSummaryRow],
        reason: Option<&str>,
    ) -> Result<BatchUpdateReport> {
        if !self.executor.test_connection().await {
            return Err(SyncError::CouldNotConnect("connectivity probe failed".into()));
        }

        let request = BatchUpdateRequest::new(
            sync_id,
            reason.map(str::to_string),
            changes,
            SyncMeta {
                engine_version: self.settings.engine_version.clone(),
                console_version: self.settings.console_version.clone(),
            },
        );

        self.executor.update_prices(&request).await
    }

    async fn best_effort<F>(&self, kind: &'static str, sync_id: Uuid, notification: F)
    where
        F: Future<Output = Result<()>>,
    {
        match tokio::time::timeout(self.settings.notify_timeout, notification).await {
            Ok(Ok(())) => debug!(sync_id = %sync_id, kind, "Notification sent"),
            Ok(Err(e)) => warn!(sync_id = %sync_id, kind, error = %e, "Notification failed"),
            Err(_) => warn!(
                sync_id = %sync_id,
                kind,
                timeout_ms = self.settings.notify_timeout.as_millis() as u64,
                "Notification timed out"
            ),
        }
    }
}

/// Rejects malformed change lists before anything touches the network.
pub fn check_changes(changes: &[ChangeSummaryRow]) -> Result<()> {
    if changes.is_empty() {
        return Err(SyncError::EmptyBatch);
    }

    let mut seen = HashSet::with_capacity(changes.len());
    for change in changes {
        validate_item_code(&change.item_code).map_err(|e| SyncError::InvalidChange {
            item_code: change.item_code.clone(),
            reason: e.to_string(),
        })?;

        if !seen.insert(change.item_code.as_str()) {
            return Err(SyncError::DuplicateChange(change.item_code.clone()));
        }

        if !change.has_changes() {
            return Err(SyncError::InvalidChange {
                item_code: change.item_code.clone(),
                reason: "no new cost or stock value".into(),
            });
        }

        if let Some(cost) = change.new_cost_price {
            validate_cost_price(cost).map_err(|e| SyncError::InvalidChange {
                item_code: change.item_code.clone(),
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

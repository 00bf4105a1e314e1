//! # stockline-sync: ERP Sync Layer for the Stockline Console
//!
//! Every side effect of the console lives here: reading the item snapshot,
//! pushing committed price changes to the ERP, and announcing sync
//! attempts in a chat.
//!
//! ## Sync Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Commit → ERP                                     │
//! │                                                                         │
//! │  stockline-core::collect_changes(rows)                                 │
//! │        │ Vec<ChangeSummaryRow>                                          │
//! │        ▼                                                                │
//! │  ┌──────────────────────┐   notify_sync_start   ┌───────────────────┐  │
//! │  │   SyncController     │──────────────────────►│   SyncNotifier    │  │
//! │  │   execute_sync()     │   notify_sync_*       │   (chat bot)      │  │
//! │  │                      │──────────────────────►│                   │  │
//! │  └──────────┬───────────┘                       └───────────────────┘  │
//! │             │ test_connection / update_prices                          │
//! │             ▼                                                           │
//! │  ┌──────────────────────┐          HTTPS         ┌───────────────────┐  │
//! │  │ BatchUpdateExecutor  │───────────────────────►│       ERP         │  │
//! │  │     (ErpClient)      │◄───────────────────────│  batch endpoint   │  │
//! │  └──────────────────────┘                        └───────────────────┘  │
//! │             │                                                           │
//! │             ▼                                                           │
//! │        SyncResult { success, sync_id, failure, failed_items }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`controller`] - One-attempt-at-a-time sync orchestration
//! - [`erp`] - ERP HTTP client and the executor trait
//! - [`snapshot`] - ERP and fixture snapshot sources
//! - [`notify`] - Chat notifications
//! - [`protocol`] - ERP wire shapes
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Sync error types

pub mod config;
pub mod controller;
pub mod erp;
pub mod error;
pub mod notify;
pub mod protocol;
pub mod snapshot;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{ConsoleConfig, SnapshotSourceKind, CONSOLE_VERSION};
pub use controller::{ControllerSettings, SyncController, SyncFailureKind, SyncPhase, SyncResult};
pub use erp::{BatchUpdateExecutor, ErpClient};
pub use error::{Result, SyncError};
pub use notify::{notifier_from_config, NoOpNotifier, SyncNotifier, TelegramNotifier};
pub use protocol::{BatchUpdateReport, BatchUpdateRequest, ItemFailure, SyncMeta};
pub use snapshot::{snapshot_source_from_config, ErpSnapshotSource, FixtureSnapshotSource, SnapshotSource};

//! # Snapshot Sources
//!
//! Where the console's read-only item snapshot comes from.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Snapshot Source Selection                           │
//! │                                                                         │
//! │  [snapshot] source = "erp"      ──► ErpSnapshotSource                  │
//! │                                     GET items, rupees → paise,          │
//! │                                     GST slab checked per item           │
//! │                                                                         │
//! │  [snapshot] source = "fixture"  ──► FixtureSnapshotSource              │
//! │                                     JSON file of ItemSnapshot           │
//! │                                                                         │
//! │  Both: duplicate item codes reject the whole snapshot                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use stockline_core::{check_unique_item_codes, ItemSnapshot};

use crate::config::{ConsoleConfig, SnapshotSourceKind};
use crate::erp::ErpClient;
use crate::error::{Result, SyncError};

/// Supplies the last-known ERP state of every item.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Vec<ItemSnapshot>>;

    /// Source name for logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// ERP Source
// =============================================================================

/// Reads the snapshot from the ERP items endpoint.
#[derive(Debug, Clone)]
pub struct ErpSnapshotSource {
    client: ErpClient,
}

impl ErpSnapshotSource {
    pub fn new(client: ErpClient) -> Self {
        ErpSnapshotSource { client }
    }
}

#[async_trait]
impl SnapshotSource for ErpSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Vec<ItemSnapshot>> {
        let items = self.client.fetch_items().await?;

        let snapshot = items
            .into_iter()
            .map(|item| item.into_snapshot())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        check_unique_item_codes(&snapshot)?;

        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "erp"
    }
}

// =============================================================================
// Fixture Source
// =============================================================================

/// Serves a fixed snapshot from memory or a JSON file.
///
/// The file holds an array of items in the console's own format (amounts in
/// paise, GST as a fraction).
#[derive(Debug, Clone)]
pub struct FixtureSnapshotSource {
    items: Option<Vec<ItemSnapshot>>,
    path: Option<PathBuf>,
}

impl FixtureSnapshotSource {
    pub fn from_items(items: Vec<ItemSnapshot>) -> Self {
        FixtureSnapshotSource {
            items: Some(items),
            path: None,
        }
    }

    /// Reads the file on every fetch so edits show up without a restart.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        FixtureSnapshotSource {
            items: None,
            path: Some(path.into()),
        }
    }

    async fn read_file(path: &Path) -> Result<Vec<ItemSnapshot>> {
        debug!(?path, "Reading snapshot fixture");
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::FixtureLoadFailed(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| SyncError::FixtureLoadFailed(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl SnapshotSource for FixtureSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Vec<ItemSnapshot>> {
        let snapshot = match (&self.items, &self.path) {
            (Some(items), _) => items.clone(),
            (None, Some(path)) => Self::read_file(path).await?,
            (None, None) => {
                return Err(SyncError::Internal("fixture source has no items".into()));
            }
        };

        check_unique_item_codes(&snapshot)?;
        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Builds the snapshot source the configuration selects.
pub fn snapshot_source_from_config(config: &ConsoleConfig) -> Result<Arc<dyn SnapshotSource>> {
    let source: Arc<dyn SnapshotSource> = match config.snapshot.source {
        SnapshotSourceKind::Erp => Arc::new(ErpSnapshotSource::new(ErpClient::new(&config.erp)?)),
        SnapshotSourceKind::Fixture => {
            let path = config.snapshot.fixture_path.clone().ok_or_else(|| {
                SyncError::InvalidConfig("snapshot.fixture_path is not set".into())
            })?;
            Arc::new(FixtureSnapshotSource::from_file(path))
        }
    };

    info!(source = source.name(), "Snapshot source selected");
    Ok(source)
}

//! Working edits file: `{ "ITEM-001": { "cost_price": 110000 } }`, amounts
//! in paise.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use stockline_core::{ChangeSummaryRow, WorkingSet};
use stockline_sync::SyncResult;

/// Reads the edits file. A missing file means no edits.
pub fn load(path: &Path) -> Result<WorkingSet> {
    if !path.exists() {
        debug!(?path, "No edits file, starting clean");
        return Ok(WorkingSet::new());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading edits file {}", path.display()))?;
    let working: WorkingSet = serde_json::from_str(&contents)
        .with_context(|| format!("parsing edits file {}", path.display()))?;

    info!(?path, count = working.len(), "Loaded working edits");
    Ok(working)
}

pub fn save(path: &Path, working: &WorkingSet) -> Result<()> {
    let contents = serde_json::to_string_pretty(working)?;
    std::fs::write(path, contents)
        .with_context(|| format!("writing edits file {}", path.display()))?;

    info!(?path, count = working.len(), "Saved working edits");
    Ok(())
}

/// Drops the edits the ERP now holds after a sync attempt and returns true
/// when the working set changed.
///
/// A successful sync settles every submitted row. A partial rejection
/// settles the applied rows and keeps the refused ones. Any other failure
/// settles nothing. Orphaned edits are never submitted, so they always stay.
pub fn settle(working: &mut WorkingSet, submitted: &[ChangeSummaryRow], result: &SyncResult) -> bool {
    let refused: HashSet<&str> = result.failed_item_codes().collect();
    let partial = result.applied > 0 && !refused.is_empty();
    if !result.success && !partial {
        return false;
    }

    let before = working.len();
    working.discard_all(
        submitted
            .iter()
            .map(|change| change.item_code.as_str())
            .filter(|code| !refused.contains(code)),
    );
    working.len() != before
}

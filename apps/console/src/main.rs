//! # Stockline Console
//!
//! Reviews cost/stock edits against the ERP snapshot and commits the
//! resulting prices.
//!
//! ## Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stockline-console                                │
//! │                                                                         │
//! │  1. Load config          (--config, console.toml, STOCKLINE_* env)     │
//! │  2. Fetch snapshot       (ERP items endpoint or fixture)               │
//! │  3. Overlay edits        (--edits edits.json)                          │
//! │  4. Print grid           (prices, margins, guardrail issues, orphans)  │
//! │  5. --commit             collect changes → SyncController → SyncResult │
//! │                                                                         │
//! │  Exit code: 0 on success / review only, 1 on blocked or failed sync    │
//! │             2 on invalid configuration                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod edits;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stockline_core::{DiffBuilder, RateCard};
use stockline_sync::{
    notifier_from_config, snapshot_source_from_config, ConsoleConfig, ControllerSettings,
    ErpClient, SyncController,
};

#[derive(Parser, Debug)]
#[command(
    name = "stockline-console",
    version,
    about = "Review cost and stock edits and sync the derived prices to the ERP"
)]
struct Cli {
    /// Config file (defaults to the platform config dir's console.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Working edits JSON: { "ITEM-001": { "cost_price": 110000 } } (paise)
    #[arg(long, short)]
    edits: Option<PathBuf>,

    /// Push modified rows to the ERP
    #[arg(long)]
    commit: bool,

    /// Reason recorded with the batch
    #[arg(long, requires = "commit")]
    reason: Option<String>,

    /// Print the grid as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Console failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match ConsoleConfig::load(cli.config.clone()) {
        Ok(config) => config,
        Err(e) if e.is_config_error() => {
            error!(error = %e, "Configuration rejected");
            eprintln!("configuration error: {}", e);
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e).context("loading configuration"),
    };

    let source = snapshot_source_from_config(&config)?;
    let snapshot = source
        .fetch_snapshot()
        .await
        .with_context(|| format!("fetching snapshot from {}", source.name()))?;
    info!(source = source.name(), items = snapshot.len(), "Snapshot loaded");

    let mut working = match &cli.edits {
        Some(path) => edits::load(path)?,
        None => Default::default(),
    };

    let view = DiffBuilder::new(RateCard::default(), config.validation)
        .build_console(&snapshot, &working);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::table(&view));
    }

    for code in &view.orphaned_item_codes {
        warn!(item_code = %code, "Edit refers to an item missing from the snapshot");
    }

    if !cli.commit {
        return Ok(ExitCode::SUCCESS);
    }

    let changes = match view.changes() {
        Ok(changes) => changes,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let controller = SyncController::new(
        Arc::new(ErpClient::new(&config.erp)?),
        notifier_from_config(&config.notify)?,
        ControllerSettings::from_config(&config),
    );

    let result = controller.execute_sync(&changes, cli.reason.as_deref()).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(path) = &cli.edits {
        if edits::settle(&mut working, &changes, &result) {
            edits::save(path, &working)?;
        }
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

//! # Console Configuration
//!
//! Configuration for the ERP connection, notifications and snapshot source.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKLINE_ERP_URL=https://erp.example.in                           │
//! │     STOCKLINE_ERP_TOKEN=...                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config PATH, or                                                  │
//! │     ~/.config/stockline-console/console.toml (Linux)                   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost ERP, notifications off, ERP snapshot                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # console.toml
//! [erp]
//! base_url = "https://erp.example.in"
//! api_token = "..."
//! request_timeout_secs = 30
//!
//! [notify]
//! enabled = true
//! bot_token = "123456:ABC"
//! chat_id = "-1001234567890"
//!
//! [snapshot]
//! source = "erp"          # erp | fixture
//!
//! [validation]
//! warn_jump_bps = 2000
//! block_jump_bps = 5000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use stockline_core::ValidationPolicy;

use crate::erp::join_path;
use crate::error::{Result, SyncError};

/// Version of this console build, stamped on every batch.
pub const CONSOLE_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// ERP Settings
// =============================================================================

/// Where the ERP lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpSettings {
    /// Base URL, e.g. `https://erp.example.in`.
    #[serde(default = "default_erp_url")]
    pub base_url: String,

    /// Bearer token sent on every request.
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_items_path")]
    pub items_path: String,

    #[serde(default = "default_batch_path")]
    pub batch_path: String,

    #[serde(default = "default_ping_path")]
    pub ping_path: String,

    /// Upper bound for the batch and snapshot calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound for the connectivity probe.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,
}

fn default_erp_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_items_path() -> String {
    "/api/stockline/items".to_string()
}
fn default_batch_path() -> String {
    "/api/stockline/prices/batch".to_string()
}
fn default_ping_path() -> String {
    "/api/ping".to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_ping_timeout() -> u64 {
    5
}

impl Default for ErpSettings {
    fn default() -> Self {
        ErpSettings {
            base_url: default_erp_url(),
            api_token: None,
            items_path: default_items_path(),
            batch_path: default_batch_path(),
            ping_path: default_ping_path(),
            request_timeout_secs: default_request_timeout(),
            ping_timeout_secs: default_ping_timeout(),
        }
    }
}

impl ErpSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }
}

// =============================================================================
// Notification Settings
// =============================================================================

/// Chat-bot notifications about sync attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default)]
    pub chat_id: Option<String>,

    /// Bot API root. Overridable so tests can point at a local server.
    #[serde(default = "default_notify_api")]
    pub api_base: String,

    /// Bound on each notification; a slow chat API never delays a verdict
    /// by more than this.
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

fn default_notify_api() -> String {
    "https://api.telegram.org".to_string()
}
fn default_notify_timeout() -> u64 {
    5
}

impl Default for NotifySettings {
    fn default() -> Self {
        NotifySettings {
            enabled: false,
            bot_token: None,
            chat_id: None,
            api_base: default_notify_api(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

impl NotifySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Snapshot Settings
// =============================================================================

/// Which snapshot source feeds the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSourceKind {
    /// Live ERP items endpoint.
    #[default]
    Erp,
    /// JSON file on disk.
    Fixture,
}

impl std::fmt::Display for SnapshotSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotSourceKind::Erp => write!(f, "erp"),
            SnapshotSourceKind::Fixture => write!(f, "fixture"),
        }
    }
}

impl std::str::FromStr for SnapshotSourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "erp" => Ok(SnapshotSourceKind::Erp),
            "fixture" | "file" => Ok(SnapshotSourceKind::Fixture),
            _ => Err(format!("Unknown snapshot source: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSettings {
    #[serde(default)]
    pub source: SnapshotSourceKind,

    /// Required when `source = "fixture"`.
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
}

// =============================================================================
// Console Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Reported in batch metadata.
    #[serde(default = "default_console_version")]
    pub console_version: String,
}

fn default_console_version() -> String {
    CONSOLE_VERSION.to_string()
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        ConsoleSettings {
            console_version: default_console_version(),
        }
    }
}

// =============================================================================
// Main Console Configuration
// =============================================================================

/// Complete console configuration.
///
/// The rate card is not configurable: prices always come from the card
/// `ENGINE_VERSION` names, so unknown sections such as `[pricing]` are
/// rejected rather than ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub erp: ErpSettings,

    #[serde(default)]
    pub notify: NotifySettings,

    #[serde(default)]
    pub snapshot: SnapshotSettings,

    /// Price-jump thresholds.
    #[serde(default)]
    pub validation: ValidationPolicy,

    #[serde(default)]
    pub console: ConsoleSettings,
}

impl ConsoleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (console.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading console config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        let erp = parse_http_url("erp.base_url", &self.erp.base_url)?;
        for (field, path) in [
            ("erp.items_path", &self.erp.items_path),
            ("erp.batch_path", &self.erp.batch_path),
            ("erp.ping_path", &self.erp.ping_path),
        ] {
            join_path(&erp, path)
                .map_err(|e| SyncError::InvalidUrl(format!("{}: {}", field, e)))?;
        }

        if self.erp.request_timeout_secs == 0 || self.erp.ping_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "ERP timeouts must be greater than 0".into(),
            ));
        }

        if self.notify.enabled {
            parse_http_url("notify.api_base", &self.notify.api_base)?;
            if is_blank(&self.notify.bot_token) || is_blank(&self.notify.chat_id) {
                return Err(SyncError::InvalidConfig(
                    "notify.bot_token and notify.chat_id are required when notifications are enabled"
                        .into(),
                ));
            }
            if self.notify.timeout_secs == 0 {
                return Err(SyncError::InvalidConfig(
                    "notify.timeout_secs must be greater than 0".into(),
                ));
            }
        }

        if self.snapshot.source == SnapshotSourceKind::Fixture && self.snapshot.fixture_path.is_none() {
            return Err(SyncError::InvalidConfig(
                "snapshot.fixture_path is required when source = \"fixture\"".into(),
            ));
        }

        self.validation.check()?;

        if self.console.console_version.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "console.console_version must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOCKLINE_ERP_URL") {
            debug!(url = %url, "Overriding ERP URL from environment");
            self.erp.base_url = url;
        }

        if let Some(token) = lookup("STOCKLINE_ERP_TOKEN") {
            self.erp.api_token = Some(token);
        }

        // Supplying bot credentials through the environment turns
        // notifications on.
        if let Some(token) = lookup("STOCKLINE_TELEGRAM_TOKEN") {
            self.notify.bot_token = Some(token);
            self.notify.enabled = true;
        }

        if let Some(chat) = lookup("STOCKLINE_TELEGRAM_CHAT") {
            self.notify.chat_id = Some(chat);
        }

        if let Some(source) = lookup("STOCKLINE_SNAPSHOT_SOURCE") {
            match source.parse() {
                Ok(kind) => {
                    debug!(source = %source, "Overriding snapshot source from environment");
                    self.snapshot.source = kind;
                }
                Err(e) => warn!(error = %e, "Ignoring STOCKLINE_SNAPSHOT_SOURCE"),
            }
        }

        if let Some(path) = lookup("STOCKLINE_FIXTURE_PATH") {
            self.snapshot.fixture_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("in", "stockline", "stockline-console")
            .map(|dirs| dirs.config_dir().join("console.toml"))
    }
}

fn parse_http_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| SyncError::InvalidUrl(format!("{}: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SyncError::InvalidUrl(format!(
            "{} must use http or https, got: {}",
            field, other
        ))),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.snapshot.source, SnapshotSourceKind::Erp);
        assert!(!config.notify.enabled);
        assert_eq!(config.validation.warn_jump_bps, 2000);
        assert_eq!(config.console.console_version, CONSOLE_VERSION);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ConsoleConfig::default();

        config.erp.base_url = "ftp://erp.local".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.erp.base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.erp.base_url = "https://erp.example.in".into();
        assert!(config.validate().is_ok());

        config.snapshot.source = SnapshotSourceKind::Fixture;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
        config.snapshot.fixture_path = Some(PathBuf::from("items.json"));
        assert!(config.validate().is_ok());

        config.notify.enabled = true;
        assert!(config.validate().is_err());
        config.notify.bot_token = Some("123:abc".into());
        config.notify.chat_id = Some("42".into());
        assert!(config.validate().is_ok());

        config.validation.block_jump_bps = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STOCKLINE_ERP_URL", "https://erp.example.in"),
            ("STOCKLINE_ERP_TOKEN", "secret"),
            ("STOCKLINE_TELEGRAM_TOKEN", "123:abc"),
            ("STOCKLINE_TELEGRAM_CHAT", "-100"),
            ("STOCKLINE_SNAPSHOT_SOURCE", "fixture"),
            ("STOCKLINE_FIXTURE_PATH", "/tmp/items.json"),
        ]
        .into_iter()
        .collect();

        let mut config = ConsoleConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.erp.base_url, "https://erp.example.in");
        assert_eq!(config.erp.api_token.as_deref(), Some("secret"));
        assert!(config.notify.enabled);
        assert_eq!(config.notify.chat_id.as_deref(), Some("-100"));
        assert_eq!(config.snapshot.source, SnapshotSourceKind::Fixture);
        assert_eq!(config.snapshot.fixture_path, Some(PathBuf::from("/tmp/items.json")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_source_in_env_is_ignored() {
        let mut config = ConsoleConfig::default();
        config.apply_env_overrides(|key| {
            (key == "STOCKLINE_SNAPSHOT_SOURCE").then(|| "spreadsheet".to_string())
        });
        assert_eq!(config.snapshot.source, SnapshotSourceKind::Erp);
    }

    #[test]
    fn test_partial_toml() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [erp]
            base_url = "https://erp.example.in"

            [validation]
            warn_jump_bps = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.erp.batch_path, "/api/stockline/prices/batch");
        assert_eq!(config.validation.warn_jump_bps, 1500);
        assert_eq!(config.validation.block_jump_bps, 5000);
    }

    #[test]
    fn test_pricing_section_is_rejected() {
        let parsed = toml::from_str::<ConsoleConfig>(
            r#"
            [pricing]
            standard_markup_bps = 1000
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_pricing_section_fails_load() {
        let dir = std::env::temp_dir().join(format!("stockline-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("console.toml");
        std::fs::write(&path, "[pricing]\nstandard_markup_bps = 1000\n").unwrap();

        let err = ConsoleConfig::load(Some(path)).unwrap_err();
        assert!(err.is_config_error(), "unexpected error: {err:?}");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("erp".parse::<SnapshotSourceKind>().unwrap(), SnapshotSourceKind::Erp);
        assert_eq!("FIXTURE".parse::<SnapshotSourceKind>().unwrap(), SnapshotSourceKind::Fixture);
        assert!("csv".parse::<SnapshotSourceKind>().is_err());
    }
}

//! # Sync Notifications
//!
//! Chat messages announcing the start and outcome of each sync attempt.
//!
//! Notifications are side effects only. The controller bounds each call by
//! a timeout and logs failures; nothing here can change a sync verdict.
//!
//! ```text
//! SyncController ──► dyn SyncNotifier
//!                       ├── TelegramNotifier   POST /bot{token}/sendMessage
//!                       └── NoOpNotifier       (notifications disabled)
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::config::NotifySettings;
use crate::erp::join_path;
use crate::error::{Result, SyncError};

// =============================================================================
// Notifier Trait
// =============================================================================

/// Receives sync lifecycle announcements.
#[async_trait]
pub trait SyncNotifier: Send + Sync {
    async fn notify_sync_start(&self, count: usize, sync_id: Uuid) -> Result<()>;

    async fn notify_sync_success(&self, sync_id: Uuid, count: usize) -> Result<()>;

    async fn notify_sync_fail(&self, sync_id: Uuid, error: &str) -> Result<()>;
}

/// Notifier that does nothing (notifications disabled).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl SyncNotifier for NoOpNotifier {
    async fn notify_sync_start(&self, _count: usize, _sync_id: Uuid) -> Result<()> {
        Ok(())
    }

    async fn notify_sync_success(&self, _sync_id: Uuid, _count: usize) -> Result<()> {
        Ok(())
    }

    async fn notify_sync_fail(&self, _sync_id: Uuid, _error: &str) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Message Text
// =============================================================================

pub fn start_message(count: usize, sync_id: Uuid) -> String {
    format!(
        "Price sync started: {} item(s)\nSync ID: {}",
        count, sync_id
    )
}

pub fn success_message(sync_id: Uuid, count: usize) -> String {
    format!(
        "Price sync succeeded: {} item(s) updated\nSync ID: {}",
        count, sync_id
    )
}

pub fn fail_message(sync_id: Uuid, error: &str) -> String {
    format!("Price sync FAILED\nSync ID: {}\nError: {}", sync_id, error)
}

// =============================================================================
// Telegram Notifier
// =============================================================================

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts messages to a chat through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    send_url: Url,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(settings: &NotifySettings) -> Result<Self> {
        let token = settings
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SyncError::InvalidConfig("notify.bot_token is not set".into()))?;
        let chat_id = settings
            .chat_id
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SyncError::InvalidConfig("notify.chat_id is not set".into()))?;

        let api_base = Url::parse(&settings.api_base)?;
        let send_url = join_path(&api_base, &format!("bot{}/sendMessage", token))?;

        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| SyncError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(TelegramNotifier {
            client,
            send_url,
            chat_id,
        })
    }

    async fn send(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            disable_web_page_preview: true,
        };

        // The URL carries the bot token; keep it out of error text.
        let response = self
            .client
            .post(self.send_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::NotifyFailed(e.without_url().to_string()))?;

        let status = response.status();
        let reply: BotApiResponse = response
            .json()
            .await
            .map_err(|e| SyncError::NotifyFailed(e.without_url().to_string()))?;

        if !status.is_success() || !reply.ok {
            return Err(SyncError::NotifyFailed(format!(
                "bot API returned HTTP {}: {}",
                status.as_u16(),
                reply.description.unwrap_or_else(|| "no description".to_string())
            )));
        }

        debug!(chat_id = %self.chat_id, "Notification delivered");
        Ok(())
    }
}

#[async_trait]
impl SyncNotifier for TelegramNotifier {
    async fn notify_sync_start(&self, count: usize, sync_id: Uuid) -> Result<()> {
        self.send(&start_message(count, sync_id)).await
    }

    async fn notify_sync_success(&self, sync_id: Uuid, count: usize) -> Result<()> {
        self.send(&success_message(sync_id, count)).await
    }

    async fn notify_sync_fail(&self, sync_id: Uuid, error: &str) -> Result<()> {
        self.send(&fail_message(sync_id, error)).await
    }
}

/// Builds the notifier the settings ask for.
pub fn notifier_from_config(settings: &NotifySettings) -> Result<Arc<dyn SyncNotifier>> {
    if settings.enabled {
        info!("Chat notifications enabled");
        Ok(Arc::new(TelegramNotifier::new(settings)?))
    } else {
        debug!("Chat notifications disabled");
        Ok(Arc::new(NoOpNotifier))
    }
}

//! # ERP Client
//!
//! HTTP client for the ERP price endpoints, and the executor seam the
//! controller talks to.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Batch Update Execution                             │
//! │                                                                         │
//! │  update_prices(request)                                                │
//! │       │                                                                 │
//! │       ├── empty? ──────────────────────────► EmptyBatch (no request)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  POST {batch_path}  (bearer token, request timeout)                    │
//! │       │                                                                 │
//! │       ├── refused / timed out ─────────────► CouldNotConnect           │
//! │       ├── 502 / 503 / 504 ─────────────────► ErpUnavailable            │
//! │       ├── other non-2xx ───────────────────► ErpStatus                 │
//! │       ├── success: false ──────────────────► ErpRejected { failed }    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BatchUpdateReport { applied, failures }                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ErpSettings;
use crate::error::{Result, SyncError};
use crate::protocol::{BatchUpdateReport, BatchUpdateRequest, BatchUpdateResponse, ErpItem, ItemsEnvelope};

/// Longest slice of an error body kept in `ErpStatus`.
const MAX_ERROR_BODY: usize = 512;

// =============================================================================
// Executor Trait
// =============================================================================

/// Pushes a batch of price changes to the system of record.
#[async_trait]
pub trait BatchUpdateExecutor: Send + Sync {
    /// Cheap reachability probe with no side effects.
    async fn test_connection(&self) -> bool;

    /// Sends the batch. One request per call, never retried here.
    async fn update_prices(&self, request: &BatchUpdateRequest) -> Result<BatchUpdateReport>;
}

// =============================================================================
// ERP Client
// =============================================================================

/// reqwest-backed client for the ERP REST API.
#[derive(Debug, Clone)]
pub struct ErpClient {
    client: reqwest::Client,
    api_token: Option<String>,
    items_url: Url,
    batch_url: Url,
    ping_url: Url,
    ping_timeout: Duration,
}

impl ErpClient {
    pub fn new(settings: &ErpSettings) -> Result<Self> {
        let base = Url::parse(&settings.base_url)?;

        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(settings.ping_timeout())
            .user_agent(concat!("stockline-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ErpClient {
            client,
            api_token: settings.api_token.clone().filter(|t| !t.is_empty()),
            items_url: join_path(&base, &settings.items_path)?,
            batch_url: join_path(&base, &settings.batch_path)?,
            ping_url: join_path(&base, &settings.ping_path)?,
            ping_timeout: settings.ping_timeout(),
        })
    }

    /// Fetches the raw item list for a snapshot.
    pub async fn fetch_items(&self) -> Result<Vec<ErpItem>> {
        debug!(url = %self.items_url, "Fetching ERP items");

        let response = self.authorized(self.client.get(self.items_url.clone())).send().await?;
        let response = check_status(response).await?;
        let envelope: ItemsEnvelope = response.json().await?;

        let items = envelope.into_items();
        info!(count = items.len(), "Fetched ERP items");
        Ok(items)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl BatchUpdateExecutor for ErpClient {
    async fn test_connection(&self) -> bool {
        let request = self
            .authorized(self.client.get(self.ping_url.clone()))
            .timeout(self.ping_timeout);

        match request.send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!("ERP reachable");
                true
            }
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "ERP ping returned non-success status");
                false
            }
            Err(e) => {
                warn!(error = %e, "ERP ping failed");
                false
            }
        }
    }

    async fn update_prices(&self, request: &BatchUpdateRequest) -> Result<BatchUpdateReport> {
        if request.is_empty() {
            return Err(SyncError::EmptyBatch);
        }

        debug!(sync_id = %request.sync_id, count = request.len(), "Posting price batch");

        let response = self
            .authorized(self.client.post(self.batch_url.clone()))
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: BatchUpdateResponse = response.json().await?;

        let failures = body.failed.clone().unwrap_or_default();

        if !body.success {
            return Err(SyncError::ErpRejected {
                message: body
                    .message
                    .clone()
                    .unwrap_or_else(|| "ERP reported failure".to_string()),
                details: body.details_text(),
                failed: failures,
            });
        }

        let applied = body
            .applied
            .unwrap_or_else(|| request.len().saturating_sub(failures.len()));

        Ok(BatchUpdateReport { applied, failures })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Appends an endpoint path to the base URL, keeping any path prefix the
/// base already has (`https://host/erp` + `/api/ping`).
pub fn join_path(base: &Url, path: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Ok(Url::parse(&joined)?)
}

/// Maps a non-2xx status to an error.
pub fn status_error(status: StatusCode, body: &str) -> SyncError {
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            SyncError::ErpUnavailable {
                status: status.as_u16(),
            }
        }
        _ => SyncError::ErpStatus {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        },
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "ERP returned error status");
    Err(status_error(status, &body))
}

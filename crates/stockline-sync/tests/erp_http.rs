//! HTTP integration tests: a fake ERP and chat bot API served by axum on a
//! random local port, driven through the real reqwest clients.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use stockline_core::{ChangeSummaryRow, GstRate, Money, ENGINE_VERSION};
use stockline_sync::config::{ErpSettings, NotifySettings};
use stockline_sync::{
    BatchUpdateExecutor, ControllerSettings, ErpClient, ErpSnapshotSource, SnapshotSource,
    SyncController, SyncError, SyncFailureKind, TelegramNotifier,
};

// =============================================================================
// Fake Servers
// =============================================================================

struct FakeErp {
    items: Value,
    batch_status: StatusCode,
    batch_reply: Value,
    batches: Mutex<Vec<Value>>,
    auth: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
}

impl FakeErp {
    fn new(batch_status: StatusCode, batch_reply: Value) -> Self {
        FakeErp {
            items: json!({
                "data": [
                    {
                        "item_code": "ITEM-001",
                        "item_name": "Toor Dal 30kg",
                        "cost_price": 1000.0,
                        "stock_quantity": 100.0,
                        "gst_rate": 0.18,
                        "previous_base_selling_price": 1350.0
                    },
                    {
                        "item_code": "ITEM-002",
                        "item_name": "Basmati Rice 25kg",
                        "cost_price": 1899.5,
                        "stock_quantity": 0.0,
                        "gst_rate": 0.05
                    }
                ]
            }),
            batch_status,
            batch_reply,
            batches: Mutex::new(Vec::new()),
            auth: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    fn ok() -> Self {
        FakeErp::new(StatusCode::OK, json!({"success": true}))
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

async fn ping() -> &'static str {
    "pong"
}

async fn items(State(fake): State<Arc<FakeErp>>) -> Json<Value> {
    Json(fake.items.clone())
}

async fn batch(
    State(fake): State<Arc<FakeErp>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.batches.lock().unwrap().push(body);
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        fake.auth.lock().unwrap().push(auth.to_string());
    }
    (fake.batch_status, Json(fake.batch_reply.clone()))
}

async fn send_message(State(fake): State<Arc<FakeErp>>, Json(body): Json<Value>) -> Json<Value> {
    let text = body["text"].as_str().unwrap_or_default().to_string();
    fake.messages.lock().unwrap().push(text);
    Json(json!({"ok": true, "result": {"message_id": 1}}))
}

async fn serve(fake: Arc<FakeErp>) -> String {
    let app = Router::new()
        .route("/api/ping", get(ping))
        .route("/api/stockline/items", get(items))
        .route("/api/stockline/prices/batch", post(batch))
        .route("/tg/botTEST/sendMessage", post(send_message))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// =============================================================================
// Helpers
// =============================================================================

fn erp_settings(base_url: &str) -> ErpSettings {
    ErpSettings {
        base_url: base_url.to_string(),
        api_token: Some("secret".into()),
        request_timeout_secs: 5,
        ping_timeout_secs: 2,
        ..ErpSettings::default()
    }
}

fn notify_settings(base_url: &str) -> NotifySettings {
    NotifySettings {
        enabled: true,
        bot_token: Some("TEST".into()),
        chat_id: Some("42".into()),
        api_base: format!("{}/tg", base_url),
        timeout_secs: 2,
    }
}

fn controller(base_url: &str) -> SyncController {
    SyncController::new(
        Arc::new(ErpClient::new(&erp_settings(base_url)).unwrap()),
        Arc::new(TelegramNotifier::new(&notify_settings(base_url)).unwrap()),
        ControllerSettings::default(),
    )
}

fn change(code: &str) -> ChangeSummaryRow {
    ChangeSummaryRow {
        item_code: code.into(),
        new_cost_price: Some(Money::from_rupees(1100)),
        new_stock_quantity: None,
        new_base_selling_price: Money::from_rupees(1485),
        previous_base_selling_price: Some(Money::from_rupees(1350)),
    }
}

// =============================================================================
// Snapshot
// =============================================================================

#[tokio::test]
async fn test_snapshot_over_http() {
    let base = serve(Arc::new(FakeErp::ok())).await;
    let source = ErpSnapshotSource::new(ErpClient::new(&erp_settings(&base)).unwrap());

    let snapshot = source.fetch_snapshot().await.unwrap();

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].cost_price, Money::from_rupees(1000));
    assert_eq!(snapshot[0].previous_base_selling_price, Some(Money::from_rupees(1350)));
    assert_eq!(snapshot[1].cost_price, Money::from_paise(189_950));
    assert_eq!(snapshot[1].gst_rate, GstRate::Five);
    assert_eq!(snapshot[1].previous_base_selling_price, None);
}

#[tokio::test]
async fn test_snapshot_rejects_unsupported_gst() {
    let mut fake = FakeErp::ok();
    fake.items = json!([{
        "item_code": "ITEM-009",
        "item_name": "Ghee 1L",
        "cost_price": 500.0,
        "stock_quantity": 4.0,
        "gst_rate": 0.12
    }]);
    let base = serve(Arc::new(fake)).await;
    let source = ErpSnapshotSource::new(ErpClient::new(&erp_settings(&base)).unwrap());

    let err = source.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, SyncError::DataQuality(_)));
    assert!(err.to_string().contains("ITEM-009"));
}

// =============================================================================
// Batch Updates
// =============================================================================

#[tokio::test]
async fn test_successful_sync_end_to_end() {
    let fake = Arc::new(FakeErp::ok());
    let base = serve(fake.clone()).await;
    let ctl = controller(&base);

    let result = ctl.execute_sync(&[change("ITEM-001")], Some("supplier revision")).await;

    assert!(result.success, "unexpected failure: {:?}", result);
    assert_eq!(result.applied, 1);

    let batches = fake.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0]["sync_id"], result.sync_id.to_string());
    assert_eq!(batches[0]["reason"], "supplier revision");
    assert_eq!(batches[0]["meta"]["engine_version"], ENGINE_VERSION);
    assert_eq!(batches[0]["changes"][0]["new_base_selling_price"], json!(1485.0));
    assert_eq!(fake.auth.lock().unwrap().clone(), vec!["Bearer secret".to_string()]);

    let messages = fake.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("started"));
    assert!(messages[1].contains("succeeded"));
    assert!(messages.iter().all(|m| m.contains(&result.sync_id.to_string())));
}

#[tokio::test]
async fn test_erp_503_reports_connectivity() {
    let fake = Arc::new(FakeErp::new(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"success": false, "message": "maintenance"}),
    ));
    let base = serve(fake.clone()).await;
    let ctl = controller(&base);

    let result = ctl.execute_sync(&[change("ITEM-001")], None).await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(SyncFailureKind::Connectivity));
    assert!(result.message.contains("Could not connect"));
    assert!(result.details.unwrap().contains("Could not connect"));

    let messages = fake.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].contains("FAILED"));
    assert!(!messages.iter().any(|m| m.contains("succeeded")));
}

#[tokio::test]
async fn test_rejected_items_are_reported() {
    let fake = Arc::new(FakeErp::new(
        StatusCode::OK,
        json!({
            "success": false,
            "message": "1 of 2 items rejected",
            "failed": [{"item_code": "ITEM-002", "error": "price locked by category manager"}]
        }),
    ));
    let base = serve(fake.clone()).await;
    let ctl = controller(&base);

    let result = ctl
        .execute_sync(&[change("ITEM-001"), change("ITEM-002")], None)
        .await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(SyncFailureKind::RemoteRejection));
    assert_eq!(result.failed_items.len(), 1);
    assert_eq!(result.failed_items[0].item_code, "ITEM-002");
    assert_eq!(result.failed_items[0].reason, "price locked by category manager");
}

#[tokio::test]
async fn test_client_error_status() {
    let fake = Arc::new(FakeErp::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({"error": "changes[0].new_base_selling_price must be positive"}),
    ));
    let base = serve(fake).await;
    let client = ErpClient::new(&erp_settings(&base)).unwrap();

    let request = stockline_sync::BatchUpdateRequest::new(
        uuid::Uuid::new_v4(),
        None,
        &[change("ITEM-001")],
        stockline_sync::SyncMeta {
            engine_version: ENGINE_VERSION.into(),
            console_version: "test".into(),
        },
    );

    match client.update_prices(&request).await {
        Err(SyncError::ErpStatus { status, body }) => {
            assert_eq!(status, 422);
            assert!(body.contains("must be positive"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_closed_port_is_could_not_connect() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = ErpClient::new(&erp_settings(&base)).unwrap();
    assert!(!client.test_connection().await);

    let ctl = SyncController::new(
        Arc::new(client),
        Arc::new(stockline_sync::NoOpNotifier),
        ControllerSettings::default(),
    );
    let result = ctl.execute_sync(&[change("ITEM-001")], None).await;
    assert_eq!(result.failure, Some(SyncFailureKind::Connectivity));
}

//! Integration tests against a stub Bot API.
//!
//! Each test spins up an Axum server on a random port that records every
//! Bot API call, points `TelegramApi` at it, and drives the real webhook
//! routes and dispatcher.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tower::ServiceExt;

use lead_bot::channels::{Channel, TelegramApi, WebhookChannel};
use lead_bot::config::WebhookConfig;
use lead_bot::dispatcher::Dispatcher;
use lead_bot::error::ChannelError;
use lead_bot::flow::LeadFlow;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const ADMIN: i64 = 451706092;

/// Chat id the stub refuses to deliver to.
const UNREACHABLE_CHAT: i64 = 666;

type Calls = Arc<Mutex<Vec<(String, Value)>>>;

async fn stub_method(
    State(calls): State<Calls>,
    Path((_bot, method)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    calls.lock().await.push((method.clone(), body.clone()));

    match method.as_str() {
        "sendMessage" if body["chat_id"] == UNREACHABLE_CHAT => (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"})),
        ),
        "sendMessage" => (
            StatusCode::OK,
            Json(json!({"ok": true, "result": {"message_id": 1, "date": 0, "chat": {"id": body["chat_id"], "type": "private"}}})),
        ),
        "getMe" => (
            StatusCode::OK,
            Json(json!({"ok": true, "result": {"id": 1, "is_bot": true, "first_name": "Lead", "username": "lead_bot"}})),
        ),
        _ => (StatusCode::OK, Json(json!({"ok": true, "result": true}))),
    }
}

/// Start the stub on a random port, return (api, recorded calls).
async fn start_stub() -> (TelegramApi, Calls) {
    let calls: Calls = Arc::default();
    let app = Router::new()
        .route("/{bot}/{method}", post(stub_method))
        .with_state(Arc::clone(&calls));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = TelegramApi::with_base_url(
        SecretString::from("123:TEST".to_string()),
        format!("http://127.0.0.1:{port}"),
    );
    (api, calls)
}

async fn calls_named(calls: &Calls, method: &str) -> Vec<Value> {
    calls
        .lock()
        .await
        .iter()
        .filter(|(m, _)| m == method)
        .map(|(_, body)| body.clone())
        .collect()
}

/// Poll until `method` has been called `n` times.
async fn wait_for_calls(calls: &Calls, method: &str, n: usize) -> Vec<Value> {
    timeout(TEST_TIMEOUT, async {
        loop {
            let found = calls_named(calls, method).await;
            if found.len() >= n {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {n} {method} calls"))
}

fn webhook_config() -> WebhookConfig {
    WebhookConfig {
        base_url: "https://bot.example.com".into(),
        secret: SecretString::from("s3cret".to_string()),
        port: 0,
    }
}

fn message_update(update_id: i64, text: &str) -> String {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": 1700000000,
            "chat": {"id": 42, "type": "private"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ivan", "last_name": "Kuznetsov", "username": "ivan_k"},
            "text": text
        }
    })
    .to_string()
}

fn callback_update(update_id: i64, data: &str) -> String {
    json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb-{update_id}"),
            "chat_instance": "ci",
            "from": {"id": 42, "is_bot": false, "first_name": "Ivan", "last_name": "Kuznetsov", "username": "ivan_k"},
            "message": {"message_id": 1, "date": 1700000000, "chat": {"id": 42, "type": "private"}},
            "data": data
        }
    })
    .to_string()
}

async fn post_update(channel: &WebhookChannel, body: String) {
    let resp = channel
        .router()
        .oneshot(
            Request::post("/webhook/s3cret")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ── Bot API client ──────────────────────────────────────────────────────

#[tokio::test]
async fn welcome_is_sent_with_one_button_row_per_option() {
    let (api, calls) = start_stub().await;
    let flow = LeadFlow::default();

    api.send_message(42, &flow.welcome()).await.unwrap();

    let sent = calls_named(&calls, "sendMessage").await;
    assert_eq!(sent.len(), 1);
    let rows = sent[0]["reply_markup"]["inline_keyboard"].as_array().unwrap();
    let ids: Vec<&str> = rows
        .iter()
        .map(|row| {
            assert_eq!(row.as_array().unwrap().len(), 1);
            row[0]["callback_data"].as_str().unwrap()
        })
        .collect();
    assert_eq!(ids, ["opt_consult", "opt_40days", "opt_pregnancy", "opt_individual"]);
}

#[tokio::test]
async fn api_rejection_carries_description() {
    let (api, _calls) = start_stub().await;

    let err = api
        .send_message(UNREACHABLE_CHAT, &lead_bot::channels::OutgoingMessage::new("hi"))
        .await
        .unwrap_err();

    match err {
        ChannelError::SendFailed { reason, .. } => {
            assert!(reason.contains("chat not found"), "reason: {reason}")
        }
        other => panic!("expected SendFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn get_me_reads_username() {
    let (api, _calls) = start_stub().await;
    let me = api.get_me().await.unwrap();
    assert_eq!(me.username.as_deref(), Some("lead_bot"));
}

// ── Webhook lifecycle ───────────────────────────────────────────────────

#[tokio::test]
async fn webhook_is_registered_on_start_and_removed_on_shutdown() {
    let (api, calls) = start_stub().await;
    let channel = WebhookChannel::new(api, webhook_config());

    let _events = channel.start().await.unwrap();
    let registered = calls_named(&calls, "setWebhook").await;
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0]["url"], "https://bot.example.com/webhook/s3cret");

    channel.shutdown().await.unwrap();
    assert_eq!(calls_named(&calls, "deleteWebhook").await.len(), 1);
}

// ── End to end ──────────────────────────────────────────────────────────

#[tokio::test]
async fn lead_travels_from_webhook_to_admin() {
    let (api, calls) = start_stub().await;
    let channel = WebhookChannel::new(api.clone(), webhook_config());
    let dispatcher = Dispatcher::new(LeadFlow::default(), Arc::new(api), ADMIN);

    let events = channel.start().await.unwrap();
    let pump = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.run(events).await })
    };

    post_update(&channel, message_update(1, "/start ref42")).await;
    post_update(&channel, callback_update(2, "opt_40days")).await;
    post_update(&channel, message_update(3, "  t.me/ivan_k ")).await;

    let sent = wait_for_calls(&calls, "sendMessage", 4).await;
    let answered = wait_for_calls(&calls, "answerCallbackQuery", 1).await;
    assert_eq!(answered[0]["callback_query_id"], "cb-2");

    let chats: Vec<i64> = sent.iter().map(|b| b["chat_id"].as_i64().unwrap()).collect();
    assert_eq!(chats, [42, 42, ADMIN, 42]);

    let report = sent[2]["text"].as_str().unwrap();
    assert!(report.contains("👤 User: Ivan Kuznetsov (id: 42) @ivan_k"), "{report}");
    assert!(report.contains("📌 Format: 40 дней сопровождения"), "{report}");
    assert!(report.contains("🔗 Contact (TG): https://t.me/ivan_k"), "{report}");
    assert!(report.contains("🏷 start param: ref42"), "{report}");
    assert!(sent[3]["text"].as_str().unwrap().contains("https://t.me/bloome_woman"));

    // The lane commits the session only after the last reply returns.
    timeout(TEST_TIMEOUT, async {
        while dispatcher.sessions().get(42).await.is_some() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session was never cleared");
    pump.abort();
}

#[tokio::test]
async fn failed_admin_delivery_still_confirms_and_clears() {
    let (api, calls) = start_stub().await;
    let dispatcher = Dispatcher::new(LeadFlow::default(), Arc::new(api), UNREACHABLE_CHAT);
    let user = lead_bot::channels::User {
        id: 42,
        full_name: "Ivan".into(),
        username: None,
    };

    dispatcher
        .handle(lead_bot::channels::IncomingEvent::text(42, user.clone(), "/start"))
        .await
        .unwrap();
    dispatcher
        .handle(lead_bot::channels::IncomingEvent::selection(42, user.clone(), "cb", "opt_consult"))
        .await
        .unwrap();
    let result = dispatcher
        .handle(lead_bot::channels::IncomingEvent::text(42, user, "@ivan_k"))
        .await;

    assert!(matches!(result, Err(ChannelError::SendFailed { .. })));
    assert_eq!(dispatcher.sessions().get(42).await, None);
    let sent = calls_named(&calls, "sendMessage").await;
    assert_eq!(sent.last().unwrap()["chat_id"], 42);
}

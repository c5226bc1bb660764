//! Push mode: Telegram POSTs updates to `/webhook/<secret>`.

use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use futures::stream;
use tokio::sync::{Mutex, mpsc};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::api::TelegramApi;
use super::types::Update;
use crate::channels::{Channel, EventStream, IncomingEvent};
use crate::config::WebhookConfig;
use crate::error::ChannelError;

/// Axum handler state (cloneable).
#[derive(Clone)]
struct HookState {
    incoming_tx: mpsc::UnboundedSender<IncomingEvent>,
}

/// Telegram channel fed by an inbound HTTP endpoint.
///
/// - `router()` builds the axum routes; the webhook handler decodes each
///   update and pushes it into an mpsc queue.
/// - `start()` registers the public URL with Telegram and hands out the
///   receiving end of that queue as the event stream.
/// - `shutdown()` removes the registration.
pub struct WebhookChannel {
    api: TelegramApi,
    config: WebhookConfig,
    incoming_tx: mpsc::UnboundedSender<IncomingEvent>,
    /// Receiver side of the incoming queue, consumed once.
    incoming_rx: Mutex<Option<mpsc::UnboundedReceiver<IncomingEvent>>>,
}

impl WebhookChannel {
    pub fn new(api: TelegramApi, config: WebhookConfig) -> Self {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        Self {
            api,
            config,
            incoming_tx,
            incoming_rx: Mutex::new(Some(incoming_rx)),
        }
    }

    /// Routes: `GET /` health check and `POST <webhook path>`.
    pub fn router(&self) -> Router {
        let state = HookState {
            incoming_tx: self.incoming_tx.clone(),
        };

        Router::new()
            .route("/", get(health))
            .route(&self.config.path(), post(receive_update))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Take the event stream without touching the Bot API.
    pub async fn events(&self) -> Result<EventStream, ChannelError> {
        let rx = self
            .incoming_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::StartupFailed {
                name: self.name().to_string(),
                reason: "start() already called".to_string(),
            })?;

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "telegram-webhook"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let events = self.events().await?;

        self.api
            .set_webhook(&self.config.url())
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })?;
        info!(base_url = %self.config.base_url, "Webhook registered");

        Ok(events)
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        self.api.delete_webhook().await?;
        info!("Webhook removed");
        Ok(())
    }
}

// ── Handlers ────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "OK"
}

/// Always answers 200 once the body is read: a non-2xx makes Telegram
/// redeliver the same update indefinitely.
async fn receive_update(State(state): State<HookState>, body: Bytes) -> StatusCode {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Undecodable webhook update");
            return StatusCode::OK;
        }
    };

    let update_id = update.update_id;
    match update.into_event() {
        Some(event) => {
            if state.incoming_tx.send(event).is_err() {
                warn!(update_id, "Webhook queue closed; update dropped");
            }
        }
        None => debug!(update_id, "Ignoring unsupported update"),
    }

    StatusCode::OK
}

//! Pull mode: long-polls `getUpdates`.

use std::time::Duration;

use async_trait::async_trait;

use super::api::TelegramApi;
use super::types::Update;
use crate::channels::{Channel, EventStream, IncomingEvent};
use crate::error::ChannelError;

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Decode a `getUpdates` batch, advancing `offset` past every entry that
/// carries an `update_id`, including ones that fail to decode.
fn decode_batch(offset: &mut i64, updates: Vec<serde_json::Value>) -> Vec<IncomingEvent> {
    let mut events = Vec::with_capacity(updates.len());

    for value in updates {
        let update_id = value.get("update_id").and_then(serde_json::Value::as_i64);
        if let Some(id) = update_id {
            *offset = (*offset).max(id + 1);
        }

        let update: Update = match serde_json::from_value(value) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(?update_id, error = %e, "Skipping undecodable update");
                continue;
            }
        };

        match update.into_event() {
            Some(event) => events.push(event),
            None => tracing::debug!(?update_id, "Ignoring unsupported update"),
        }
    }

    events
}

/// Telegram channel that fetches updates itself; exposes no listener.
pub struct PollingChannel {
    api: TelegramApi,
}

impl PollingChannel {
    pub fn new(api: TelegramApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Channel for PollingChannel {
    fn name(&self) -> &str {
        "telegram-polling"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        // getUpdates is refused while a webhook is registered.
        self.api
            .delete_webhook()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let api = self.api.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let updates = match api.get_updates(offset).await {
                    Ok(updates) => updates,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                for event in decode_batch(&mut offset, updates) {
                    if tx.send(event).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram polling channel shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn malformed_update_is_skipped_and_offset_advances() {
        let batch = vec![
            serde_json::json!({"update_id": 10, "message": {"chat": "not an object"}}),
            serde_json::json!({
                "update_id": 11,
                "message": {
                    "message_id": 1,
                    "chat": {"id": 42, "type": "private"},
                    "from": {"id": 42, "is_bot": false, "first_name": "Ivan"},
                    "text": "/start"
                }
            }),
            serde_json::json!({"update_id": 12, "edited_message": {}}),
        ];

        let mut offset = 0;
        let events = decode_batch(&mut offset, batch);

        assert_eq!(offset, 13);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, crate::channels::Payload::Text("/start".into()));
    }

    #[test]
    fn entry_without_update_id_leaves_offset() {
        let mut offset = 5;
        let events = decode_batch(&mut offset, vec![serde_json::json!({"garbage": true})]);
        assert_eq!(offset, 5);
        assert!(events.is_empty());
    }

    #[test]
    fn polling_channel_name() {
        let ch = PollingChannel::new(TelegramApi::new(SecretString::from("t".to_string())));
        assert_eq!(ch.name(), "telegram-polling");
    }

    #[tokio::test]
    async fn start_fails_when_api_unreachable() {
        let api = TelegramApi::with_base_url(
            SecretString::from("t".to_string()),
            "http://127.0.0.1:9",
        );
        let err = PollingChannel::new(api).start().await.err().unwrap();
        assert!(matches!(err, ChannelError::StartupFailed { .. }), "got {err:?}");
    }
}

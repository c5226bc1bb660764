//! Thin Bot API client over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use super::types::{ApiResponse, BotInfo, SendMessage};
use crate::channels::{Messenger, OutgoingMessage};
use crate::error::ChannelError;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Long-poll timeout passed to `getUpdates`, in seconds.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Bot API client. Cheap to clone.
#[derive(Clone)]
pub struct TelegramApi {
    token: SecretString,
    base_url: String,
    client: reqwest::Client,
}

impl TelegramApi {
    pub fn new(token: SecretString) -> Self {
        Self::with_base_url(token, DEFAULT_API_BASE)
    }

    /// Point the client at another Bot API server (local server, test stub).
    pub fn with_base_url(token: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.base_url,
            self.token.expose_secret()
        )
    }

    /// POST a JSON body to `method` and unwrap the `{ok, result}` envelope.
    async fn call<T, B>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, ChannelError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let mut request = self.client.post(self.api_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // The URL embeds the token; keep it out of error messages.
        let resp = request
            .send()
            .await
            .map_err(|e| ChannelError::Http(e.without_url().to_string()))?;
        let status = resp.status();
        let envelope: ApiResponse<T> = resp.json().await.map_err(|e| {
            ChannelError::Http(format!("{method}: {status}: {}", e.without_url()))
        })?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(ChannelError::Api {
                method: method.to_string(),
                description: description.unwrap_or_else(|| status.to_string()),
            }),
        }
    }

    pub async fn get_me(&self) -> Result<BotInfo, ChannelError> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Long-poll for updates after `offset`.
    ///
    /// Updates come back undecoded so one malformed entry cannot fail the
    /// whole batch.
    pub async fn get_updates(
        &self,
        offset: i64,
    ) -> Result<Vec<serde_json::Value>, ChannelError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "callback_query"]
        });
        // Leave headroom over the server-side long-poll timeout.
        let timeout = Duration::from_secs(POLL_TIMEOUT_SECS + 10);
        self.call("getUpdates", &body, Some(timeout)).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), ChannelError> {
        let body = SendMessage::new(chat_id, message);
        let _: serde_json::Value = self
            .call("sendMessage", &body, None)
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
    ) -> Result<(), ChannelError> {
        let body = serde_json::json!({ "callback_query_id": callback_query_id });
        let _: bool = self.call("answerCallbackQuery", &body, None).await?;
        Ok(())
    }

    pub async fn set_webhook(&self, url: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "url": url,
            "allowed_updates": ["message", "callback_query"]
        });
        let _: bool = self.call("setWebhook", &body, None).await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), ChannelError> {
        let _: bool = self
            .call("deleteWebhook", &serde_json::json!({}), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramApi {
    async fn send_message(
        &self,
        chat_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), ChannelError> {
        TelegramApi::send_message(self, chat_id, message).await
    }

    async fn answer_selection(&self, callback_id: &str) -> Result<(), ChannelError> {
        self.answer_callback_query(callback_id).await
    }
}

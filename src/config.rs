//! Configuration types.

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

/// Channel advertised in the thank-you message.
pub const DEFAULT_CHANNEL_URL: &str = "https://t.me/bloome_woman";

/// Port the webhook server listens on when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

/// How updates reach the bot.
#[derive(Debug, Clone)]
pub enum DeliveryMode {
    /// Long-poll `getUpdates`; no inbound listener.
    Polling,
    /// Telegram pushes updates to our HTTP endpoint.
    Webhook(WebhookConfig),
}

/// Push-mode settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Externally reachable base URL, e.g. `https://bot.example.com`.
    pub base_url: String,
    /// Secret token forming the last path segment of the webhook route.
    pub secret: SecretString,
    /// Local listen port.
    pub port: u16,
}

impl WebhookConfig {
    /// Route path the webhook handler is mounted on.
    pub fn path(&self) -> String {
        format!("/webhook/{}", self.secret.expose_secret())
    }

    /// Full URL registered with `setWebhook`.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path())
    }
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot API token.
    pub token: SecretString,
    /// Chat that receives lead reports.
    pub admin_chat_id: i64,
    /// Link shown in the confirmation message.
    pub channel_url: String,
    pub mode: DeliveryMode,
}

impl BotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = var("BOT_TOKEN").ok_or_else(|| ConfigError::MissingRequired {
            key: "BOT_TOKEN".into(),
            hint: "Create a bot with @BotFather and export its token.".into(),
        })?;

        let admin_raw = var("ADMIN_CHAT_ID").ok_or_else(|| ConfigError::MissingRequired {
            key: "ADMIN_CHAT_ID".into(),
            hint: "Send /id to the bot to find your chat id.".into(),
        })?;
        let admin_chat_id: i64 = admin_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "ADMIN_CHAT_ID".into(),
            message: format!("expected an integer chat id, got {admin_raw:?}"),
        })?;

        let channel_url = var("CHANNEL_URL").unwrap_or_else(|| DEFAULT_CHANNEL_URL.to_string());

        let mode = match var("BOT_MODE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("polling") | Some("poll") => DeliveryMode::Polling,
            Some("webhook") => DeliveryMode::Webhook(WebhookConfig::from_vars(&var)?),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "BOT_MODE".into(),
                    message: format!("expected \"polling\" or \"webhook\", got {other:?}"),
                });
            }
        };

        Ok(Self {
            token: SecretString::from(token),
            admin_chat_id,
            channel_url,
            mode,
        })
    }
}

impl WebhookConfig {
    fn from_vars(var: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = var("WEBHOOK_BASE_URL").ok_or_else(|| ConfigError::MissingRequired {
            key: "WEBHOOK_BASE_URL".into(),
            hint: "Webhook mode needs the public https URL Telegram should call.".into(),
        })?;
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(ConfigError::InvalidValue {
                key: "WEBHOOK_BASE_URL".into(),
                message: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }

        let secret = var("WEBHOOK_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            key: "WEBHOOK_SECRET".into(),
            hint: "Pick a hard-to-guess token; it becomes the webhook path.".into(),
        })?;
        if secret.contains('/') {
            return Err(ConfigError::InvalidValue {
                key: "WEBHOOK_SECRET".into(),
                message: "must be a single path segment".into(),
            });
        }

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("expected a port number, got {raw:?}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            base_url,
            secret: SecretString::from(secret),
            port,
        })
    }
}

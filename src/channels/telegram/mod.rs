//! Telegram transport: Bot API client plus the two ways of receiving updates.

pub mod api;
pub mod polling;
pub mod types;
pub mod webhook;

pub use api::TelegramApi;
pub use polling::PollingChannel;
pub use webhook::WebhookChannel;

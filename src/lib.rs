//! Telegram lead-capture bot.

pub mod channels;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod flow;
pub mod store;

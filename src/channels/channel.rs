//! Transport-neutral event types and the channel traits.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;

/// The person behind an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable platform id; sessions are keyed on it.
    pub id: i64,
    pub full_name: String,
    /// Public handle without the leading `@`.
    pub username: Option<String>,
}

/// What the event carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A plain text message (commands included).
    Text(String),
    /// A menu button press.
    Selection { callback_id: String, data: String },
    /// A message without text: photo, sticker, voice, ...
    Other,
}

/// One inbound event, already decoded from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingEvent {
    /// Chat replies go to.
    pub chat_id: i64,
    pub user: User,
    pub payload: Payload,
}

impl IncomingEvent {
    pub fn text(chat_id: i64, user: User, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user,
            payload: Payload::Text(text.into()),
        }
    }

    pub fn selection(
        chat_id: i64,
        user: User,
        callback_id: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            chat_id,
            user,
            payload: Payload::Selection {
                callback_id: callback_id.into(),
                data: data.into(),
            },
        }
    }

    pub fn other(chat_id: i64, user: User) -> Self {
        Self {
            chat_id,
            user,
            payload: Payload::Other,
        }
    }
}

/// A labelled action attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Returned as `Payload::Selection::data` when pressed.
    pub data: String,
}

/// An outgoing text message, optionally with buttons (one per row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl OutgoingMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Stream of inbound events produced by a channel.
pub type EventStream = Pin<Box<dyn Stream<Item = IncomingEvent> + Send>>;

/// An inbound transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start receiving events. May only be called once.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Undo whatever `start` registered with the platform.
    async fn shutdown(&self) -> Result<(), ChannelError>;
}

/// The outbound half: what the dispatcher needs to talk back.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), ChannelError>;

    /// Acknowledge a button press so the client stops showing it as pending.
    async fn answer_selection(&self, callback_id: &str) -> Result<(), ChannelError>;
}

//! Bot API wire types, limited to the fields the bot reads.

use serde::{Deserialize, Serialize};

use crate::channels::{IncomingEvent, OutgoingMessage, Payload, User as EventUser};

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }
}

impl From<User> for EventUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            username: user.username,
        }
    }
}

/// The message a callback button was attached to. Telegram may send it as
/// "inaccessible" (date 0, chat only), so only the chat is read.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackMessage {
    pub chat: Chat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<CallbackMessage>,
    pub data: Option<String>,
}

impl Update {
    /// Convert into a transport-neutral event.
    ///
    /// Returns `None` for update kinds the bot ignores (channel posts,
    /// messages without a sender, edited messages, ...).
    pub fn into_event(self) -> Option<IncomingEvent> {
        if let Some(message) = self.message {
            let user = message.from?;
            let payload = match message.text {
                Some(text) => Payload::Text(text),
                None => Payload::Other,
            };
            return Some(IncomingEvent {
                chat_id: message.chat.id,
                user: user.into(),
                payload,
            });
        }

        if let Some(query) = self.callback_query {
            // Private chats share the user's id.
            let chat_id = query.message.map_or(query.from.id, |m| m.chat.id);
            return Some(IncomingEvent {
                chat_id,
                user: query.from.into(),
                payload: Payload::Selection {
                    callback_id: query.id,
                    data: query.data.unwrap_or_default(),
                },
            });
        }

        None
    }
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// `sendMessage` request body.
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl<'a> SendMessage<'a> {
    /// One button per keyboard row, in order.
    pub fn new(chat_id: i64, message: &'a OutgoingMessage) -> Self {
        let reply_markup = (!message.buttons.is_empty()).then(|| InlineKeyboardMarkup {
            inline_keyboard: message
                .buttons
                .iter()
                .map(|b| {
                    vec![InlineKeyboardButton {
                        text: b.label.clone(),
                        callback_data: b.data.clone(),
                    }]
                })
                .collect(),
        });
        Self {
            chat_id,
            text: &message.text,
            reply_markup,
        }
    }
}

/// Subset of `getMe` used for the startup banner.
#[derive(Debug, Clone, Deserialize)]
pub struct BotInfo {
    pub id: i64,
    pub username: Option<String>,
}

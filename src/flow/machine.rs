//! The lead-capture state machine.
//!
//! `LeadFlow::step` is pure: it takes the user's current session and one
//! inbound event, and returns the next session plus the ordered side effects
//! the caller must perform. Persisting the session and sending messages is
//! the dispatcher's job.

use crate::channels::{Button, IncomingEvent, OutgoingMessage, Payload};

use super::command::{Command, parse_command};
use super::contact::parse_contact;
use super::menu::Menu;
use super::messages::{self, LeadReport};
use super::session::{Session, Stage};

/// A side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a message to the chat the event came from.
    Reply(OutgoingMessage),
    /// Acknowledge a button press.
    AnswerSelection { callback_id: String },
    /// Forward a completed lead to the administrator.
    NotifyAdmin(LeadReport),
}

/// Result of feeding one event to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Session to store afterwards; `None` means no active session.
    pub session: Option<Session>,
    /// Side effects, in the order they must be performed.
    pub actions: Vec<Action>,
}

impl Transition {
    fn stay(session: Option<Session>) -> Self {
        Self {
            session,
            actions: Vec::new(),
        }
    }

    fn reply(session: Option<Session>, message: OutgoingMessage) -> Self {
        Self {
            session,
            actions: vec![Action::Reply(message)],
        }
    }
}

/// The conversation definition: menu plus the link used in the thank-you text.
#[derive(Debug, Clone)]
pub struct LeadFlow {
    menu: Menu,
    channel_url: String,
}

impl LeadFlow {
    pub fn new(menu: Menu, channel_url: impl Into<String>) -> Self {
        Self {
            menu,
            channel_url: channel_url.into(),
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Welcome prompt with one button per menu option, in menu order.
    pub fn welcome(&self) -> OutgoingMessage {
        let buttons = self
            .menu
            .options()
            .iter()
            .map(|o| Button {
                label: o.label.clone(),
                data: o.id.clone(),
            })
            .collect();
        OutgoingMessage::new(messages::WELCOME).with_buttons(buttons)
    }

    /// Advance the conversation by one event.
    pub fn step(&self, session: Option<Session>, event: &IncomingEvent) -> Transition {
        if let Payload::Text(text) = &event.payload {
            match parse_command(text) {
                Some(Command::Start { param }) => {
                    return Transition::reply(Some(Session::started(param)), self.welcome());
                }
                // While collecting a contact, `/id` is just another attempt.
                Some(Command::Id)
                    if !matches!(
                        session.as_ref().map(|s| &s.stage),
                        Some(Stage::AwaitingContact { .. })
                    ) =>
                {
                    let reply = messages::id_reply(event.user.id, event.chat_id);
                    return Transition::reply(session, OutgoingMessage::new(reply));
                }
                Some(Command::Id) | None => {}
            }
        }

        let Some(current) = session else {
            return match &event.payload {
                // Stale button from an earlier conversation.
                Payload::Selection { callback_id, .. } => Transition {
                    session: None,
                    actions: vec![Action::AnswerSelection {
                        callback_id: callback_id.clone(),
                    }],
                },
                _ => Transition::stay(None),
            };
        };

        match (&current.stage, &event.payload) {
            (Stage::AwaitingOption, Payload::Selection { callback_id, data }) => {
                let label = self.menu.label_for(data).to_string();
                Transition {
                    session: Some(current.select(label)),
                    actions: vec![
                        Action::Reply(OutgoingMessage::new(messages::CONTACT_REQUEST)),
                        Action::AnswerSelection {
                            callback_id: callback_id.clone(),
                        },
                    ],
                }
            }
            (_, Payload::Selection { callback_id, .. }) => Transition {
                session: Some(current),
                actions: vec![Action::AnswerSelection {
                    callback_id: callback_id.clone(),
                }],
            },
            (Stage::AwaitingContact { selected_option }, Payload::Text(text)) => {
                match parse_contact(text) {
                    Some(contact) => {
                        let report = LeadReport {
                            full_name: event.user.full_name.clone(),
                            user_id: event.user.id,
                            username: event.user.username.clone(),
                            selected_option: selected_option.clone(),
                            contact,
                            start_param: current.start_param.clone(),
                        };
                        Transition {
                            session: None,
                            actions: vec![
                                Action::NotifyAdmin(report),
                                Action::Reply(OutgoingMessage::new(messages::thank_you(
                                    &self.channel_url,
                                ))),
                            ],
                        }
                    }
                    None => Transition::reply(
                        Some(current),
                        OutgoingMessage::new(messages::CONTACT_FORMAT_HELP),
                    ),
                }
            }
            (Stage::AwaitingContact { .. }, Payload::Other) => Transition::reply(
                Some(current),
                OutgoingMessage::new(messages::TEXT_REMINDER),
            ),
            (Stage::AwaitingOption, Payload::Text(_) | Payload::Other) => {
                Transition::stay(Some(current))
            }
        }
    }
}

impl Default for LeadFlow {
    fn default() -> Self {
        Self::new(Menu::default(), crate::config::DEFAULT_CHANNEL_URL)
    }
}

//! Dispatcher: routes inbound events through the lead flow.
//!
//! Every user gets a lane: an unbounded queue drained by its own task, so one
//! user's events are handled strictly in arrival order while different users
//! proceed concurrently. A lane that stays idle for `lane_idle` retires and is
//! recreated on that user's next event.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::channels::{EventStream, IncomingEvent, Messenger, OutgoingMessage};
use crate::error::ChannelError;
use crate::flow::{Action, LeadFlow};
use crate::store::SessionStore;

/// How long an idle lane lingers before its task exits.
pub const DEFAULT_LANE_IDLE: Duration = Duration::from_secs(300);

struct Inner {
    flow: LeadFlow,
    messenger: Arc<dyn Messenger>,
    admin_chat_id: i64,
    sessions: SessionStore,
    lanes: Mutex<HashMap<i64, mpsc::UnboundedSender<IncomingEvent>>>,
    lane_idle: Duration,
}

/// Cheap to clone; clones share sessions and lanes.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(flow: LeadFlow, messenger: Arc<dyn Messenger>, admin_chat_id: i64) -> Self {
        Self::with_lane_idle(flow, messenger, admin_chat_id, DEFAULT_LANE_IDLE)
    }

    pub fn with_lane_idle(
        flow: LeadFlow,
        messenger: Arc<dyn Messenger>,
        admin_chat_id: i64,
        lane_idle: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                flow,
                messenger,
                admin_chat_id,
                sessions: SessionStore::new(),
                lanes: Mutex::new(HashMap::new()),
                lane_idle,
            }),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Number of live lanes.
    pub async fn lane_count(&self) -> usize {
        self.inner.lanes.lock().await.len()
    }

    /// Queue an event on its user's lane, spawning the lane if needed.
    pub async fn dispatch(&self, event: IncomingEvent) {
        let user_id = event.user.id;
        let mut lanes = self.inner.lanes.lock().await;

        let event = match lanes.get(&user_id) {
            Some(tx) => match tx.send(event) {
                Ok(()) => return,
                // Lane task is gone; fall through and start a new one.
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(event);
        lanes.insert(user_id, tx);
        debug!(user_id, "Lane opened");
        tokio::spawn(run_lane(Arc::clone(&self.inner), user_id, rx));
    }

    /// Dispatch everything a channel produces until the stream ends.
    pub async fn run(&self, mut events: EventStream) {
        while let Some(event) = events.next().await {
            self.dispatch(event).await;
        }
        info!("Event stream ended");
    }

    /// Handle one event inline, bypassing lanes.
    ///
    /// Callers must not run this concurrently for the same user.
    pub async fn handle(&self, event: IncomingEvent) -> Result<(), ChannelError> {
        self.inner.handle(event).await
    }
}

impl Inner {
    async fn handle(&self, event: IncomingEvent) -> Result<(), ChannelError> {
        let user_id = event.user.id;
        let session = self.sessions.get(user_id).await;
        let transition = self.flow.step(session, &event);

        // Every action is attempted; the session is committed afterwards
        // whatever the send outcome (at-most-once delivery of leads).
        let mut first_err = None;
        for action in transition.actions {
            if let Err(e) = self.perform(&event, action).await {
                first_err.get_or_insert(e);
            }
        }

        debug!(
            user_id,
            stage = %transition
                .session
                .as_ref()
                .map_or("none".to_string(), |s| s.stage.to_string()),
            "Event handled"
        );
        self.sessions.put(user_id, transition.session).await;

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn perform(&self, event: &IncomingEvent, action: Action) -> Result<(), ChannelError> {
        match action {
            Action::Reply(message) => self.messenger.send_message(event.chat_id, &message).await,
            Action::AnswerSelection { callback_id } => {
                self.messenger.answer_selection(&callback_id).await
            }
            Action::NotifyAdmin(report) => {
                let text = report.to_string();
                let result = self
                    .messenger
                    .send_message(self.admin_chat_id, &OutgoingMessage::new(text.as_str()))
                    .await;
                match &result {
                    Ok(()) => info!(user_id = report.user_id, "Lead forwarded to admin"),
                    Err(e) => error!(
                        user_id = report.user_id,
                        admin_chat_id = self.admin_chat_id,
                        error = %e,
                        lead = %text,
                        "Failed to forward lead; it will not be retried"
                    ),
                }
                result
            }
        }
    }
}

async fn run_lane(
    inner: Arc<Inner>,
    user_id: i64,
    mut rx: mpsc::UnboundedReceiver<IncomingEvent>,
) {
    loop {
        match tokio::time::timeout(inner.lane_idle, rx.recv()).await {
            Ok(Some(event)) => {
                if let Err(e) = inner.handle(event).await {
                    warn!(user_id, error = %e, "Failed to deliver response");
                }
            }
            Ok(None) => break,
            Err(_) => {
                // Senders only push while holding the lane map, so an empty
                // queue checked under the same lock stays empty.
                let mut lanes = inner.lanes.lock().await;
                if rx.is_empty() {
                    lanes.remove(&user_id);
                    debug!(user_id, "Lane retired");
                    break;
                }
            }
        }
    }
}

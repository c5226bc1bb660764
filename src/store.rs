//! In-memory session registry keyed by user id.
//!
//! The store itself only guards the map. Serializing a single user's
//! read-modify-write is the caller's job; the dispatcher does it by giving
//! each user one lane.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::flow::Session;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: i64) -> Option<Session> {
        self.sessions.lock().await.get(&user_id).cloned()
    }

    /// Store the user's session, or drop it when `session` is `None`.
    pub async fn put(&self, user_id: i64, session: Option<Session>) {
        let mut sessions = self.sessions.lock().await;
        match session {
            Some(session) => {
                sessions.insert(user_id, session);
            }
            None => {
                sessions.remove(&user_id);
            }
        }
    }

    /// Number of users with an active session.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

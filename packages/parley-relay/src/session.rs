//! Session store.
//!
//! Maps resumable session tokens to the identity they were issued for.
//! Sessions are never removed while the process runs, so a client can always
//! resume with the token it was handed on its first connection.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{RelayError, Result};
use crate::protocol::{SessionId, UserId};

/// A resumable identity binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub user_name: String,
    /// Aggregate online status of `user_id` across all its connections.
    pub connected: bool,
}

/// Session ID → session, remembering insertion order for roster building.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    order: Vec<SessionId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve handshake credentials to a session.
    ///
    /// A known `session_id` returns the stored session unchanged. Otherwise a
    /// non-empty `user_name` mints a fresh session and user ID. With neither,
    /// nothing is stored and [`RelayError::InvalidSession`] is returned.
    pub fn resolve(&mut self, session_id: Option<&str>, user_name: Option<&str>) -> Result<Session> {
        if let Some(session) = session_id.and_then(|id| self.sessions.get(id)) {
            return Ok(session.clone());
        }

        let user_name = user_name
            .filter(|name| !name.is_empty())
            .ok_or(RelayError::InvalidSession)?;

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            user_name: user_name.to_string(),
            connected: false,
        };

        tracing::info!(
            session_id = session.session_id.as_str(),
            user_id = session.user_id.as_str(),
            user_name = session.user_name.as_str(),
            "Created session"
        );

        self.order.push(session.session_id.clone());
        self.sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    /// Overwrite the connected flag of a session.
    /// Returns false if the session is unknown; nothing is created.
    pub fn upsert_connected(&mut self, session_id: &str, connected: bool) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) => {
                session.connected = connected;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// All sessions in the order they were issued.
    pub fn list_all(&self) -> Vec<Session> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

//! Presence coordinator.
//!
//! Owns the per-user connect/disconnect state machine:
//!
//! ```text
//!   Unknown ──connect──► Online ──last connection closes──► Offline
//!                          ▲                                   │
//!                          └──────────────reconnect────────────┘
//! ```
//!
//! Online/Offline is never stored per connection. It is derived from the
//! number of live connections in the user's gateway group and mirrored into
//! the session's `connected` flag, which only flips to false when that count
//! reaches zero.

use std::sync::Arc;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::protocol::{HandshakeAuth, RosterEntry, ServerMessage};
use crate::session::Session;
use crate::state::{RelayCore, SharedCore};

#[derive(Clone)]
pub struct PresenceCoordinator {
    core: SharedCore,
    gateway: Arc<dyn Gateway>,
}

impl PresenceCoordinator {
    pub fn new(core: SharedCore, gateway: Arc<dyn Gateway>) -> Self {
        Self { core, gateway }
    }

    /// Bring a freshly handshaken connection online.
    ///
    /// On success the connection has joined its user's group and has been
    /// sent `session` and `users`; every other identified connection has been
    /// sent `user connected`. If the handshake cannot be resolved the
    /// connection is sent `invalid session` and nothing else happens.
    pub fn connect(&self, conn_id: &str, auth: &HandshakeAuth) -> Result<Session> {
        let mut core = self.core.lock();

        let mut session = match core
            .sessions
            .resolve(auth.session_id.as_deref(), auth.user_name.as_deref())
        {
            Ok(session) => session,
            Err(e) => {
                tracing::info!(conn_id = conn_id, "Rejected handshake: {}", e);
                self.gateway
                    .emit_to_self(conn_id, ServerMessage::InvalidSession);
                return Err(e);
            }
        };

        core.sessions.upsert_connected(&session.session_id, true);
        session.connected = true;

        self.gateway.join_group(conn_id, &session.user_id);

        self.gateway.emit_to_self(
            conn_id,
            ServerMessage::Session {
                session_id: session.session_id.clone(),
                user_id: session.user_id.clone(),
            },
        );

        let users = roster_for(&core, &session.user_id);
        self.gateway
            .emit_to_self(conn_id, ServerMessage::Users(users));

        self.gateway.broadcast_to_others(
            conn_id,
            ServerMessage::UserConnected(RosterEntry {
                user_id: session.user_id.clone(),
                user_name: session.user_name.clone(),
                connected: true,
                messages: Vec::new(),
            }),
        );

        tracing::info!(
            conn_id = conn_id,
            user_id = session.user_id.as_str(),
            user_name = session.user_name.as_str(),
            "User connected"
        );

        Ok(session)
    }

    /// Take a closing connection out of its user's group and, if it was the
    /// last one, mark the user offline and broadcast `user disconnected`.
    ///
    /// Returns true only when the offline transition happened. Calling this
    /// again for the same connection is a no-op. If the gateway cannot report
    /// a live count the user is left online.
    pub fn disconnect(&self, conn_id: &str, session: &Session) -> bool {
        let mut core = self.core.lock();

        let Some(user_id) = self.gateway.leave_group(conn_id) else {
            return false;
        };

        match self.gateway.count_live(&user_id) {
            Ok(0) => {}
            Ok(remaining) => {
                tracing::debug!(
                    conn_id = conn_id,
                    user_id = user_id.as_str(),
                    remaining = remaining,
                    "Connection closed, user still online"
                );
                return false;
            }
            Err(e) => {
                tracing::warn!(
                    conn_id = conn_id,
                    user_id = user_id.as_str(),
                    error = %e,
                    "Live count unavailable, keeping user online"
                );
                return false;
            }
        }

        let still_marked_online = core
            .sessions
            .get(&session.session_id)
            .map(|s| s.connected)
            .unwrap_or(false);
        if !still_marked_online {
            return false;
        }

        self.gateway
            .broadcast_to_others(conn_id, ServerMessage::UserDisconnected(user_id.clone()));
        core.sessions.upsert_connected(&session.session_id, false);

        tracing::info!(
            conn_id = conn_id,
            user_id = user_id.as_str(),
            "User disconnected"
        );
        true
    }
}

/// Every known user, in session order, with `user_id`'s history with each.
fn roster_for(core: &RelayCore, user_id: &str) -> Vec<RosterEntry> {
    let mut history = core.log.history_for(user_id);

    core.sessions
        .list_all()
        .into_iter()
        .map(|session| RosterEntry {
            messages: history.remove(&session.user_id).unwrap_or_default(),
            user_id: session.user_id,
            user_name: session.user_name,
            connected: session.connected,
        })
        .collect()
}

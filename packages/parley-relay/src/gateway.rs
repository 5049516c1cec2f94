//! Connection gateway.
//!
//! The [`Gateway`] trait is the only way the presence coordinator and relay
//! router reach clients: they address a single connection, a user's group of
//! connections, or everyone else, and never see sockets directly.
//!
//! [`ConnectionHub`] is the in-process implementation used by the WebSocket
//! handler. Each connection owns an unbounded channel whose receiver is
//! drained by that connection's writer task, so every emit is a non-blocking
//! channel send.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::GatewayError;
use crate::protocol::{ConnectionId, ServerMessage, UserId};

/// Group-scoped delivery primitives offered by the transport.
pub trait Gateway: Send + Sync {
    /// Deliver to the originating connection only.
    fn emit_to_self(&self, conn_id: &str, message: ServerMessage) -> bool;

    /// Deliver to every connection in the user's group.
    /// Returns the number of connections the message was handed to.
    fn emit_to_group(&self, user_id: &str, message: ServerMessage) -> usize;

    /// Deliver to every identified connection except `conn_id`.
    fn broadcast_to_others(&self, conn_id: &str, message: ServerMessage) -> usize;

    /// Add a connection to the group addressed by `user_id`.
    fn join_group(&self, conn_id: &str, user_id: &str);

    /// Remove a connection from its group, returning the group it was in.
    /// Returns None if the connection never joined (or already left).
    fn leave_group(&self, conn_id: &str) -> Option<UserId>;

    /// Number of connections currently in the user's group.
    fn count_live(&self, user_id: &str) -> Result<usize, GatewayError>;
}

/// A connected client's sender channel.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// Channel-backed gateway shared by every WebSocket connection.
#[derive(Clone, Default)]
pub struct ConnectionHub {
    /// Connection ID → sender channel, for every open socket.
    connections: Arc<DashMap<ConnectionId, ClientSender>>,

    /// Connection ID → user ID, for connections that completed a handshake.
    memberships: Arc<DashMap<ConnectionId, UserId>>,

    /// User ID → connections currently bound to that user.
    groups: Arc<DashMap<UserId, HashSet<ConnectionId>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an open socket so it can be addressed by `emit_to_self`.
    pub fn register(&self, conn_id: &str, sender: ClientSender) {
        tracing::debug!(conn_id = conn_id, "Connection registered");
        self.connections.insert(conn_id.to_string(), sender);
    }

    /// Forget a closed socket. Group membership is released separately
    /// through [`Gateway::leave_group`] by the presence coordinator.
    pub fn unregister(&self, conn_id: &str) {
        tracing::debug!(conn_id = conn_id, "Connection unregistered");
        self.connections.remove(conn_id);
    }

    fn send(&self, conn_id: &str, message: ServerMessage) -> bool {
        match self.connections.get(conn_id) {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Number of open sockets, identified or not.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of users with at least one live connection.
    pub fn online_user_count(&self) -> usize {
        self.groups.len()
    }
}

impl Gateway for ConnectionHub {
    fn emit_to_self(&self, conn_id: &str, message: ServerMessage) -> bool {
        self.send(conn_id, message)
    }

    fn emit_to_group(&self, user_id: &str, message: ServerMessage) -> usize {
        let members: Vec<ConnectionId> = match self.groups.get(user_id) {
            Some(group) => group.iter().cloned().collect(),
            None => return 0,
        };

        members
            .iter()
            .filter(|conn_id| self.send(conn_id, message.clone()))
            .count()
    }

    fn broadcast_to_others(&self, conn_id: &str, message: ServerMessage) -> usize {
        let others: Vec<ConnectionId> = self
            .memberships
            .iter()
            .filter(|entry| entry.key() != conn_id)
            .map(|entry| entry.key().clone())
            .collect();

        others
            .iter()
            .filter(|other| self.send(other, message.clone()))
            .count()
    }

    fn join_group(&self, conn_id: &str, user_id: &str) {
        self.memberships
            .insert(conn_id.to_string(), user_id.to_string());
        self.groups
            .entry(user_id.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    fn leave_group(&self, conn_id: &str) -> Option<UserId> {
        let (_, user_id) = self.memberships.remove(conn_id)?;

        if let Some(mut group) = self.groups.get_mut(&user_id) {
            group.remove(conn_id);
        }
        self.groups.remove_if(&user_id, |_, group| group.is_empty());

        Some(user_id)
    }

    fn count_live(&self, user_id: &str) -> Result<usize, GatewayError> {
        Ok(self.groups.get(user_id).map(|group| group.len()).unwrap_or(0))
    }
}

//! Server state management.
//!
//! The session store and message log live together in [`RelayCore`] behind a
//! single mutex. Every connect, private message and disconnect handler holds
//! that lock for its whole read/modify/emit sequence, so handlers never
//! interleave. Socket bookkeeping lives in the [`ConnectionHub`], which is
//! concurrent (DashMap) so writer tasks never touch the core lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::gateway::{ConnectionHub, Gateway};
use crate::message_log::MessageLog;
use crate::presence::PresenceCoordinator;
use crate::relay::RelayRouter;
use crate::session::SessionStore;

/// Default port, matching the port the web client expects.
const DEFAULT_PORT: u16 = 3001;

/// Default maximum size of a private message body (64 KiB).
const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Private messages with larger content are rejected and not logged.
    pub max_message_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

/// All mutable relay state that must be updated atomically.
#[derive(Debug, Default)]
pub struct RelayCore {
    pub sessions: SessionStore,
    pub log: MessageLog,
}

/// Shared handle to the core state.
pub type SharedCore = Arc<Mutex<RelayCore>>;

/// Shared server state.
#[derive(Clone)]
pub struct RelayState {
    /// Socket registry and group membership; the production gateway.
    pub hub: ConnectionHub,

    /// Connect/disconnect state machine.
    pub presence: PresenceCoordinator,

    /// Private message validation, delivery and logging.
    pub relay: RelayRouter,

    core: SharedCore,

    /// Server configuration.
    pub config: RelayConfig,

    pub started_at: DateTime<Utc>,
}

impl RelayState {
    /// Create a new relay state with the given configuration.
    pub fn new(config: RelayConfig) -> Self {
        let hub = ConnectionHub::new();
        let gateway: Arc<dyn Gateway> = Arc::new(hub.clone());
        let core: SharedCore = Arc::new(Mutex::new(RelayCore::default()));

        Self {
            presence: PresenceCoordinator::new(core.clone(), gateway.clone()),
            relay: RelayRouter::new(core.clone(), gateway, config.max_message_bytes),
            hub,
            core,
            config,
            started_at: Utc::now(),
        }
    }

    /// Number of open WebSocket connections.
    pub fn online_connections(&self) -> usize {
        self.hub.connection_count()
    }

    /// Number of users with at least one live connection.
    pub fn online_users(&self) -> usize {
        self.hub.online_user_count()
    }

    /// Number of sessions issued since startup.
    pub fn known_sessions(&self) -> usize {
        self.core.lock().sessions.len()
    }

    /// Number of private messages relayed since startup.
    pub fn logged_messages(&self) -> usize {
        self.core.lock().log.len()
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HandshakeAuth;
    use tokio::sync::mpsc;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.max_message_bytes, 65536);
    }

    #[test]
    fn test_state_creation() {
        let state = RelayState::new(RelayConfig::default());
        assert_eq!(state.online_connections(), 0);
        assert_eq!(state.online_users(), 0);
        assert_eq!(state.known_sessions(), 0);
        assert_eq!(state.logged_messages(), 0);
        assert!(state.uptime_secs() >= 0);
    }

    #[test]
    fn test_counters_follow_activity() {
        let state = RelayState::new(RelayConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        state.hub.register("c1", tx);

        let auth = HandshakeAuth {
            session_id: None,
            user_name: Some("Alice".to_string()),
        };
        let alice = state.presence.connect("c1", &auth).unwrap();
        state
            .relay
            .send(&alice.user_id, "note to self".to_string(), alice.user_id.clone())
            .unwrap();

        assert_eq!(state.online_connections(), 1);
        assert_eq!(state.online_users(), 1);
        assert_eq!(state.known_sessions(), 1);
        assert_eq!(state.logged_messages(), 1);
    }
}

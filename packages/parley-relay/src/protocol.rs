//! Relay protocol message definitions.
//!
//! The relay speaks JSON over WebSocket. Every frame is an object of the form
//! `{"event": <name>, "data": <payload>}`; event names and payload field names
//! (`sessionID`, `userID`, `userName`, ...) are part of the client contract and
//! must not change.

use serde::{Deserialize, Serialize};

/// Opaque resumable session token.
pub type SessionId = String;

/// Stable identity handle shared by all of a user's sessions and connections.
pub type UserId = String;

/// Per-socket handle used by the gateway to address a single connection.
pub type ConnectionId = String;

// ── Shared Payloads ───────────────────────────────────────────────────────────

/// A relayed private message. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub from: UserId,
    pub to: UserId,
}

/// Credentials presented in the handshake frame.
///
/// `user_name` is only consulted when `session_id` is absent or unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeAuth {
    #[serde(rename = "sessionID", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// One user as seen by a requesting connection, with the requester's history
/// with that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub connected: bool,
    pub messages: Vec<Message>,
}

// ── Client → Relay ────────────────────────────────────────────────────────────

/// Messages sent from a client to the relay server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Identify this connection. Must be sent first after connecting.
    #[serde(rename = "handshake")]
    Handshake(HandshakeAuth),

    /// Send a private message to every connection of another user.
    #[serde(rename = "private message")]
    PrivateMessage { content: String, to: UserId },
}

// ── Relay → Client ────────────────────────────────────────────────────────────

/// Messages sent from the relay server to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    /// The handshake could not be resolved to a session. The connection
    /// receives nothing else afterwards.
    #[serde(rename = "invalid session")]
    InvalidSession,

    /// The session bound to this connection.
    #[serde(rename = "session")]
    Session {
        #[serde(rename = "sessionID")]
        session_id: SessionId,
        #[serde(rename = "userID")]
        user_id: UserId,
    },

    /// Full roster for the connecting party.
    #[serde(rename = "users")]
    Users(Vec<RosterEntry>),

    /// Another user came online. Never carries history.
    #[serde(rename = "user connected")]
    UserConnected(RosterEntry),

    /// A private message addressed to this connection's user.
    #[serde(rename = "private message")]
    PrivateMessage(Message),

    /// The last connection of a user closed.
    #[serde(rename = "user disconnected")]
    UserDisconnected(UserId),

    /// A frame was rejected.
    #[serde(rename = "error")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handshake_parsing() {
        let text = r#"{"event":"handshake","data":{"sessionID":"s-1","userName":"Alice"}}"#;
        match serde_json::from_str::<ClientMessage>(text).unwrap() {
            ClientMessage::Handshake(auth) => {
                assert_eq!(auth.session_id.as_deref(), Some("s-1"));
                assert_eq!(auth.user_name.as_deref(), Some("Alice"));
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_handshake_with_empty_auth() {
        let text = r#"{"event":"handshake","data":{}}"#;
        match serde_json::from_str::<ClientMessage>(text).unwrap() {
            ClientMessage::Handshake(auth) => assert_eq!(auth, HandshakeAuth::default()),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_private_message_parsing() {
        let text = r#"{"event":"private message","data":{"content":"hi","to":"u-2"}}"#;
        match serde_json::from_str::<ClientMessage>(text).unwrap() {
            ClientMessage::PrivateMessage { content, to } => {
                assert_eq!(content, "hi");
                assert_eq!(to, "u-2");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let text = r#"{"event":"typing","data":{}}"#;
        assert!(serde_json::from_str::<ClientMessage>(text).is_err());
    }

    #[test]
    fn test_server_event_names() {
        let value = serde_json::to_value(ServerMessage::InvalidSession).unwrap();
        assert_eq!(value, json!({ "event": "invalid session" }));

        let value = serde_json::to_value(ServerMessage::Session {
            session_id: "s-1".to_string(),
            user_id: "u-1".to_string(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "event": "session", "data": { "sessionID": "s-1", "userID": "u-1" } })
        );

        let value =
            serde_json::to_value(ServerMessage::UserDisconnected("u-1".to_string())).unwrap();
        assert_eq!(value, json!({ "event": "user disconnected", "data": "u-1" }));
    }

    #[test]
    fn test_roster_entry_field_names() {
        let entry = RosterEntry {
            user_id: "u-1".to_string(),
            user_name: "Alice".to_string(),
            connected: true,
            messages: vec![Message {
                content: "x".to_string(),
                from: "u-1".to_string(),
                to: "u-2".to_string(),
            }],
        };
        let value = serde_json::to_value(ServerMessage::UserConnected(entry)).unwrap();
        assert_eq!(value["event"], "user connected");
        assert_eq!(value["data"]["userID"], "u-1");
        assert_eq!(value["data"]["userName"], "Alice");
        assert_eq!(value["data"]["connected"], true);
        assert_eq!(value["data"]["messages"][0]["from"], "u-1");
    }
}

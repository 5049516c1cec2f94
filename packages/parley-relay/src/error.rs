//! Error types for the relay core.
//!
//! Only two things can go wrong inside the core: a client that cannot be
//! identified, and a private message that fails validation. Gateway faults
//! are reported separately because the coordinator absorbs them instead of
//! surfacing them to clients.

use thiserror::Error;

/// Result type alias for relay core operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors raised by the session store and the relay router.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The handshake carried neither a resumable session nor a user name.
    #[error("invalid session: no resumable session ID and no user name supplied")]
    InvalidSession,

    /// A private message did not name a recipient.
    #[error("private message has no recipient")]
    EmptyRecipient,

    /// A private message exceeded the configured content size.
    #[error("message content is {size} bytes, maximum is {max}")]
    MessageTooLarge { size: usize, max: usize },
}

/// Faults reported by a [`Gateway`](crate::gateway::Gateway) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The transport could not answer a membership query.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RelayError::MessageTooLarge { size: 10, max: 4 }.to_string(),
            "message content is 10 bytes, maximum is 4"
        );
        assert!(RelayError::InvalidSession.to_string().starts_with("invalid session"));
        assert_eq!(
            GatewayError::Unavailable("hub closed".to_string()).to_string(),
            "gateway unavailable: hub closed"
        );
    }
}

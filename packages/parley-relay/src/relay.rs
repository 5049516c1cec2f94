//! Relay router.
//!
//! Validates an inbound private message, hands a copy to every live
//! connection of the addressed user and appends it to the message log. The
//! recipient does not have to be known or online: the message is logged either
//! way so it shows up in both parties' history on their next roster.

use std::sync::Arc;

use crate::error::{RelayError, Result};
use crate::gateway::Gateway;
use crate::protocol::{Message, ServerMessage, UserId};
use crate::state::SharedCore;

#[derive(Clone)]
pub struct RelayRouter {
    core: SharedCore,
    gateway: Arc<dyn Gateway>,
    max_message_bytes: usize,
}

impl RelayRouter {
    pub fn new(core: SharedCore, gateway: Arc<dyn Gateway>, max_message_bytes: usize) -> Self {
        Self {
            core,
            gateway,
            max_message_bytes,
        }
    }

    /// Relay `content` from `from` to every connection of `to`.
    ///
    /// Rejected messages are neither delivered nor logged.
    pub fn send(&self, from: &str, content: String, to: UserId) -> Result<Message> {
        if to.trim().is_empty() {
            return Err(RelayError::EmptyRecipient);
        }
        if content.len() > self.max_message_bytes {
            return Err(RelayError::MessageTooLarge {
                size: content.len(),
                max: self.max_message_bytes,
            });
        }

        let message = Message {
            content,
            from: from.to_string(),
            to,
        };

        let mut core = self.core.lock();
        let delivered = self
            .gateway
            .emit_to_group(&message.to, ServerMessage::PrivateMessage(message.clone()));
        core.log.append(message.clone());

        tracing::debug!(
            from = message.from.as_str(),
            to = message.to.as_str(),
            delivered = delivered,
            "Relayed private message"
        );

        Ok(message)
    }
}

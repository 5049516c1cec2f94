//! Append-only log of every relayed private message.

use std::collections::HashMap;

use crate::protocol::{Message, UserId};

#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Every message `user_id` sent or received, grouped by the other party.
    /// Arrival order is kept within each group.
    pub fn history_for(&self, user_id: &str) -> HashMap<UserId, Vec<Message>> {
        let mut history: HashMap<UserId, Vec<Message>> = HashMap::new();

        for message in &self.messages {
            let peer = if message.from == user_id {
                &message.to
            } else if message.to == user_id {
                &message.from
            } else {
                continue;
            };
            history.entry(peer.clone()).or_default().push(message.clone());
        }

        history
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

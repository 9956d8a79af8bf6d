//! ChatMessage - A single line of conversation
//!
//! Messages are immutable once created and attributed to the identity that
//! sent them.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// A message exchanged between two matched identities.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    /// Identity that authored the message
    pub sender: Identity,
    /// Message text as sent over the wire
    pub content: String,
}

impl ChatMessage {
    pub fn new(sender: Identity, content: impl Into<String>) -> Self {
        Self {
            sender,
            content: content.into(),
        }
    }

    /// Check whether `identity` authored this message
    pub fn is_from(&self, identity: &Identity) -> bool {
        &self.sender == identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_from() {
        let own = Identity::from("me");
        let message = ChatMessage::new(own.clone(), "hi");
        assert!(message.is_from(&own));
        assert!(!message.is_from(&Identity::from("peer")));
    }
}

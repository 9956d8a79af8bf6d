//! Transcript - Ordered, append-only record of a matched conversation
//!
//! Also defines the rendering contract consumed by presentation shells:
//! consecutive messages from the same sender form a run, and the stranger
//! label is attached to the first message of every stranger run.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::message::ChatMessage;

/// Label shown above the first message of a run from the other party.
pub const STRANGER_LABEL: &str = "Stranger";

/// Append-only sequence of chat messages in arrival order.
///
/// Messages are never reordered, removed or deduplicated.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end of the transcript.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    /// Project the transcript into display rows as seen by `own`.
    pub fn rows<'a>(&'a self, own: &Identity) -> Vec<TranscriptRow<'a>> {
        let mut previous_is_own = true;
        self.messages
            .iter()
            .map(|message| {
                let is_own = message.is_from(own);
                let row = TranscriptRow {
                    message,
                    is_own,
                    show_stranger_label: !is_own && previous_is_own,
                };
                previous_is_own = is_own;
                row
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// A transcript message annotated for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRow<'a> {
    pub message: &'a ChatMessage,
    /// Whether the message was authored by the viewing identity
    pub is_own: bool,
    /// Whether the stranger label precedes this message
    pub show_stranger_label: bool,
}

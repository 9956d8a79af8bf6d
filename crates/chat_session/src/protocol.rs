//! Wire protocol - JSON objects exchanged with the relay
//!
//! Every frame is a JSON object tagged by its `type` field.

use chat_core::Identity;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Messages the client sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Join { user: Identity },
    Message { content: String },
    Typing { user: Identity },
    StoppedTyping { user: Identity },
    Close { user: Identity },
}

/// Messages the relay sends to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Message { user: Identity, content: String },
    Match,
    Close,
    Typing,
    StoppedTyping,
    /// Any `type` this client does not know about.
    #[serde(other)]
    Unknown,
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Message { .. } => "message",
            Self::Typing { .. } => "typing",
            Self::StoppedTyping { .. } => "stopped_typing",
            Self::Close { .. } => "close",
        }
    }
}

pub fn encode(message: &OutboundMessage) -> Result<String, ChannelError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode(frame: &str) -> Result<InboundMessage, serde_json::Error> {
    serde_json::from_str(frame)
}

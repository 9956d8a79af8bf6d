//! Phase events - Defines events that trigger phase transitions

use serde::{Deserialize, Serialize};

/// Defines the events that can trigger phase transitions in the FSM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    // ========== User Events ==========
    /// User asked to join the relay.
    JoinRequested,

    /// User ended the conversation.
    EndRequested,

    // ========== Channel Events ==========
    /// The channel to the relay is open.
    ChannelOpened,

    /// The channel could not be opened.
    ConnectFailed { error: String },

    /// The channel closed without a `close` event from the relay.
    ChannelLost { reason: Option<String> },

    // ========== Relay Events ==========
    /// The relay paired us with a stranger.
    MatchFound,

    /// The relay (or the stranger) closed the conversation.
    PeerClosed,
}

impl PhaseEvent {
    /// Check if this event ends the session from any live phase.
    pub fn is_terminating(&self) -> bool {
        matches!(
            self,
            Self::EndRequested
                | Self::PeerClosed
                | Self::ChannelLost { .. }
                | Self::ConnectFailed { .. }
        )
    }

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRequested => "join_requested",
            Self::EndRequested => "end_requested",
            Self::ChannelOpened => "channel_opened",
            Self::ConnectFailed { .. } => "connect_failed",
            Self::ChannelLost { .. } => "channel_lost",
            Self::MatchFound => "match_found",
            Self::PeerClosed => "peer_closed",
        }
    }
}

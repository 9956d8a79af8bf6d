//! Session phases - Defines all possible phases of a chat session

use std::fmt;

use serde::{Deserialize, Serialize};

/// Defines the possible phases of a session's lifecycle.
///
/// Exactly one phase is current at a time and it decides which user
/// actions are accepted.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No connection yet; waiting for the user to join.
    #[default]
    Idle,

    /// Connection requested, channel not open yet.
    Joining,

    /// Joined the relay, waiting to be paired with a stranger.
    Waiting,

    /// Paired with a stranger; messages may be exchanged.
    Matched,

    /// Conversation over (terminal).
    Ended,
}

impl SessionPhase {
    /// Check if this is a terminal phase (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Check if messages may be sent in this phase.
    pub fn accepts_messages(&self) -> bool {
        matches!(self, Self::Matched)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Joining => "joining",
            Self::Waiting => "waiting",
            Self::Matched => "matched",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}

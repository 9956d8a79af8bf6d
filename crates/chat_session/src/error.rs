//! Session error types

use chat_core::ConfigError;
use chat_state::SessionPhase;
use thiserror::Error;

/// Errors raised by a channel implementation.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Channel is closed")]
    Closed,

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors returned by session controller operations.
///
/// None of these are fatal: the controller stays usable after returning any
/// of them.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot {action} while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: SessionPhase,
    },

    #[error("Not matched with a stranger yet")]
    NotMatched,

    #[error("The chat has ended")]
    SessionEnded,

    #[error("The session has been torn down")]
    TornDown,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

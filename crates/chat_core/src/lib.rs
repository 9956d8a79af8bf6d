//! chat_core - Core types for the stranger chat client
//!
//! This crate provides the foundational types used across all chat crates:
//! - `identity` - Opaque per-session client token
//! - `message` - Chat messages exchanged with a stranger
//! - `transcript` - Append-only transcript and its rendering contract
//! - `config` - Client configuration loading

pub mod config;
pub mod identity;
pub mod message;
pub mod transcript;

// Re-export commonly used types
pub use config::{ClientConfig, ConfigError, DEFAULT_RELAY_URL};
pub use identity::Identity;
pub use message::ChatMessage;
pub use transcript::{Transcript, TranscriptRow, STRANGER_LABEL};

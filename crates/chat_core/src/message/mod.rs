//! Message module - Chat message types
//!
//! Shared message types used across the system.

mod chat_message;

pub use chat_message::ChatMessage;

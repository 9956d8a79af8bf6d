//! chat_state - Phase state machine for stranger chat sessions
//!
//! This crate provides the FSM that gates a session through
//! join, wait, match and end.

pub mod machine;

// Re-export commonly used types
pub use machine::{PhaseEvent, SessionPhase, StateMachine, StateTransition, TransitionError};

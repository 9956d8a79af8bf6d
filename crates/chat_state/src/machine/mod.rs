//! State machine module
//!
//! Contains the FSM implementation for the session lifecycle.

mod events;
mod states;
mod transitions;

pub use events::PhaseEvent;
pub use states::SessionPhase;
pub use transitions::{StateMachine, StateTransition, TransitionError};

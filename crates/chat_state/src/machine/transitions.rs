//! Phase transitions - FSM transition logic
//!
//! Implements the state machine that handles event-driven phase transitions.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::events::PhaseEvent;
use super::states::SessionPhase;

/// Error type for invalid phase transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from} with event {event}")]
    InvalidTransition { from: SessionPhase, event: String },

    #[error("State machine is in terminal phase: {0}")]
    TerminalState(SessionPhase),
}

/// Represents a phase transition result.
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The phase before the transition.
    pub from: SessionPhase,
    /// The phase after the transition.
    pub to: SessionPhase,
    /// The event that triggered the transition.
    pub event: PhaseEvent,
    /// Whether the phase actually changed.
    pub changed: bool,
    /// When the event was handled.
    pub at: DateTime<Utc>,
}

/// State machine for managing session phase transitions.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current phase.
    current_phase: SessionPhase,
    /// Transition history (limited).
    history: Vec<StateTransition>,
    /// Max history entries to keep.
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine in the Idle phase.
    pub fn new() -> Self {
        Self::with_phase(SessionPhase::Idle)
    }

    /// Create a state machine with a specific initial phase.
    pub fn with_phase(phase: SessionPhase) -> Self {
        Self {
            current_phase: phase,
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.current_phase
    }

    /// Get the transition history.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Handle an event and transition to a new phase.
    ///
    /// Events with no transition from the current phase leave it unchanged.
    pub fn handle_event(&mut self, event: PhaseEvent) -> StateTransition {
        let next = Self::compute_next_phase(self.current_phase, &event)
            .unwrap_or(self.current_phase);
        self.record(next, event)
    }

    /// Handle an event, rejecting it if the current phase does not allow it.
    ///
    /// Nothing is recorded when the event is rejected.
    pub fn apply(&mut self, event: PhaseEvent) -> Result<StateTransition, TransitionError> {
        if self.current_phase.is_terminal() {
            return Err(TransitionError::TerminalState(self.current_phase));
        }

        match Self::compute_next_phase(self.current_phase, &event) {
            Some(next) => Ok(self.record(next, event)),
            None => Err(TransitionError::InvalidTransition {
                from: self.current_phase,
                event: event.name().to_string(),
            }),
        }
    }

    fn record(&mut self, next: SessionPhase, event: PhaseEvent) -> StateTransition {
        let from = self.current_phase;
        self.current_phase = next;

        let transition = StateTransition {
            from,
            to: next,
            event,
            changed: from != next,
            at: Utc::now(),
        };

        if transition.changed {
            tracing::debug!("phase {} -> {} on {}", from, next, transition.event.name());
        }

        // Add to history
        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    /// Compute the next phase given the current phase and event.
    ///
    /// Returns `None` when the event has no meaning in `phase`.
    fn compute_next_phase(phase: SessionPhase, event: &PhaseEvent) -> Option<SessionPhase> {
        use PhaseEvent::*;
        use SessionPhase::*;

        match (phase, event) {
            // ========== Joining ==========
            (Idle, JoinRequested) => Some(Joining),
            (Joining, ChannelOpened) => Some(Waiting),
            (Joining, ConnectFailed { .. }) => Some(Ended),

            // ========== Matching ==========
            // A match racing ahead of the open notification is still honored.
            (Joining | Waiting, MatchFound) => Some(Matched),
            (Matched, MatchFound) => Some(Matched),

            // ========== Ending ==========
            (Matched, EndRequested) => Some(Ended),
            (Joining | Waiting | Matched, PeerClosed) => Some(Ended),
            (Joining | Waiting | Matched, ChannelLost { .. }) => Some(Ended),

            // ========== Default: No transition ==========
            _ => None,
        }
    }

    /// Check if a transition is valid without executing it.
    pub fn can_transition(&self, event: &PhaseEvent) -> bool {
        Self::compute_next_phase(self.current_phase, event).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_flow() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.phase(), SessionPhase::Idle);

        let t1 = sm.handle_event(PhaseEvent::JoinRequested);
        assert!(t1.changed);
        assert_eq!(sm.phase(), SessionPhase::Joining);

        let t2 = sm.handle_event(PhaseEvent::ChannelOpened);
        assert!(t2.changed);
        assert_eq!(sm.phase(), SessionPhase::Waiting);

        let t3 = sm.handle_event(PhaseEvent::MatchFound);
        assert!(t3.changed);
        assert_eq!(sm.phase(), SessionPhase::Matched);

        let t4 = sm.handle_event(PhaseEvent::EndRequested);
        assert!(t4.changed);
        assert_eq!(sm.phase(), SessionPhase::Ended);
    }

    #[test]
    fn test_second_match_is_noop() {
        let mut sm = StateMachine::with_phase(SessionPhase::Matched);
        let t = sm.handle_event(PhaseEvent::MatchFound);
        assert!(!t.changed);
        assert_eq!(sm.phase(), SessionPhase::Matched);
    }

    #[test]
    fn test_end_requires_match() {
        let mut sm = StateMachine::with_phase(SessionPhase::Waiting);
        assert!(!sm.can_transition(&PhaseEvent::EndRequested));

        let t = sm.handle_event(PhaseEvent::EndRequested);
        assert!(!t.changed);
        assert_eq!(sm.phase(), SessionPhase::Waiting);
    }

    #[test]
    fn test_strict_apply_rejects_from_terminal() {
        let mut sm = StateMachine::with_phase(SessionPhase::Ended);
        let err = sm.apply(PhaseEvent::JoinRequested).unwrap_err();
        assert_eq!(err, TransitionError::TerminalState(SessionPhase::Ended));
        assert!(sm.history().is_empty());
    }

    #[test]
    fn test_strict_apply_rejects_rejoin() {
        let mut sm = StateMachine::with_phase(SessionPhase::Waiting);
        let err = sm.apply(PhaseEvent::JoinRequested).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { from: SessionPhase::Waiting, .. }));
        assert_eq!(sm.phase(), SessionPhase::Waiting);
    }

    #[test]
    fn test_history_tracking() {
        let mut sm = StateMachine::new();
        sm.handle_event(PhaseEvent::JoinRequested);
        sm.handle_event(PhaseEvent::ChannelOpened);

        assert_eq!(sm.history().len(), 2);
        assert_eq!(sm.history()[1].from, SessionPhase::Joining);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut sm = StateMachine::with_phase(SessionPhase::Matched);
        for _ in 0..60 {
            sm.handle_event(PhaseEvent::MatchFound);
        }
        assert_eq!(sm.history().len(), 50);
    }
}

//! Session controller - single authority over a chat session
//!
//! Owns the phase machine, transcript, typing signal, draft and connection.
//! Every mutation publishes a fresh [`SessionSnapshot`] to subscribers.

use chat_core::{ChatMessage, ClientConfig, Identity, Transcript};
use chat_state::{PhaseEvent, SessionPhase, StateMachine, StateTransition};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::channel::{ChannelEvent, Connection, Connector};
use crate::error::{ChannelError, Result, SessionError};
use crate::protocol::{self, InboundMessage, OutboundMessage};

pub const IDLE_BANNER: &str = "You are now connected";
pub const WAITING_BANNER: &str = "You will be matched soon";
pub const MATCHED_BANNER: &str = "You are matched now. You can chat";
pub const ENDED_BANNER: &str = "Your chat has been ended.";

pub const NOT_MATCHED_NOTICE: &str = "Waiting for a match. You cannot send messages yet.";
pub const NOT_IN_CHAT_NOTICE: &str = "You are not in a chat yet.";

/// Banner text shown for a phase.
pub fn banner_for(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => IDLE_BANNER,
        SessionPhase::Joining | SessionPhase::Waiting => WAITING_BANNER,
        SessionPhase::Matched => MATCHED_BANNER,
        SessionPhase::Ended => ENDED_BANNER,
    }
}

/// Read-only view of a session, handed to presentation shells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Own identity, once joined
    pub identity: Option<Identity>,
    pub phase: SessionPhase,
    pub transcript: Transcript,
    /// Whether the stranger is currently typing
    pub peer_typing: bool,
    pub banner: String,
    /// Transient notice for a rejected action
    pub notice: Option<String>,
    /// Bumped every time a notice is raised, so shells can tell a repeated
    /// rejection from a stale one.
    pub notice_seq: u64,
    /// Unsent draft text
    pub draft: String,
    pub torn_down: bool,
}

impl SessionSnapshot {
    /// Whether the shell should offer message input.
    pub fn can_send(&self) -> bool {
        !self.torn_down && self.phase.accepts_messages()
    }

    /// Whether the shell should show the terminal "chat ended" state.
    pub fn is_disconnected(&self) -> bool {
        self.phase.is_terminal()
    }
}

pub struct SessionController<C: Connector> {
    config: ClientConfig,
    connector: C,
    connection: Option<Box<dyn Connection>>,
    machine: StateMachine,
    identity: Option<Identity>,
    transcript: Transcript,
    peer_typing: bool,
    draft: String,
    notice: Option<String>,
    notice_seq: u64,
    torn_down: bool,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<C: Connector> SessionController<C> {
    pub fn new(config: ClientConfig, connector: C) -> Self {
        let initial = SessionSnapshot {
            identity: None,
            phase: SessionPhase::Idle,
            transcript: Transcript::new(),
            peer_typing: false,
            banner: IDLE_BANNER.to_string(),
            notice: None,
            notice_seq: 0,
            draft: String::new(),
            torn_down: false,
        };
        let (snapshot_tx, _) = watch::channel(initial);

        Self {
            config,
            connector,
            connection: None,
            machine: StateMachine::new(),
            identity: None,
            transcript: Transcript::new(),
            peer_typing: false,
            draft: String::new(),
            notice: None,
            notice_seq: 0,
            torn_down: false,
            snapshot_tx,
        }
    }

    // ========== Accessors ==========

    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn peer_typing(&self) -> bool {
        self.peer_typing
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn banner(&self) -> &'static str {
        banner_for(self.phase())
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Whether a connection is currently held.
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// Recent phase transitions, oldest first.
    pub fn history(&self) -> &[StateTransition] {
        self.machine.history()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            phase: self.phase(),
            transcript: self.transcript.clone(),
            peer_typing: self.peer_typing,
            banner: self.banner().to_string(),
            notice: self.notice.clone(),
            notice_seq: self.notice_seq,
            draft: self.draft.clone(),
            torn_down: self.torn_down,
        }
    }

    /// Receive a new snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // ========== User operations ==========

    /// Generate an identity and open a connection to the relay.
    ///
    /// Only accepted while `Idle`; a session joins at most once.
    pub fn join(&mut self) -> Result<Identity> {
        self.ensure_not_torn_down()?;
        if !self.machine.can_transition(&PhaseEvent::JoinRequested) {
            let phase = self.phase();
            warn!("join rejected while {phase}");
            return Err(SessionError::InvalidPhase {
                action: "join",
                phase,
            });
        }

        let identity = Identity::generate();
        let endpoint = self.config.endpoint_for(&identity)?;

        self.machine.handle_event(PhaseEvent::JoinRequested);
        self.identity = Some(identity.clone());
        self.notice = None;

        match self.connector.open(&endpoint) {
            Ok(connection) => {
                info!("joining relay at {endpoint}");
                self.connection = Some(connection);
                self.publish();
                Ok(identity)
            }
            Err(e) => {
                warn!("failed to open connection to {endpoint}: {e}");
                self.machine.handle_event(PhaseEvent::ConnectFailed {
                    error: e.to_string(),
                });
                self.publish();
                Err(e.into())
            }
        }
    }

    /// Send a chat message to the stranger.
    ///
    /// Blank text is ignored in every phase. Outside `Matched` a notice is
    /// published and nothing is sent.
    pub fn send_message(&mut self, text: &str) -> Result<()> {
        let content = text.trim();
        if content.is_empty() {
            return Ok(());
        }

        self.ensure_live()?;
        let identity = match (&self.identity, self.phase().accepts_messages()) {
            (Some(identity), true) => identity.clone(),
            _ => {
                self.raise_notice(NOT_MATCHED_NOTICE);
                return Err(SessionError::NotMatched);
            }
        };

        self.transmit(&OutboundMessage::Message {
            content: content.to_string(),
        })?;

        // The relay does not echo our own messages back.
        self.transcript.push(ChatMessage::new(identity, content));
        self.draft.clear();
        self.notice = None;
        self.publish();
        Ok(())
    }

    /// Send the current draft.
    pub fn submit_draft(&mut self) -> Result<()> {
        let draft = self.draft.clone();
        self.send_message(&draft)
    }

    /// Record a draft change and signal typing to the stranger.
    ///
    /// A non-empty draft sends `typing`; a draft that just became empty sends
    /// `stopped_typing`. Signals are only sent once the channel is open.
    pub fn notify_typing(&mut self, draft: &str) {
        if self.torn_down {
            return;
        }

        let was_empty = self.draft.is_empty();
        self.draft = draft.to_string();

        let channel_open = matches!(self.phase(), SessionPhase::Waiting | SessionPhase::Matched);
        if let (true, Some(user)) = (channel_open, self.identity.clone()) {
            let signal = if !draft.is_empty() {
                Some(OutboundMessage::Typing { user })
            } else if !was_empty {
                Some(OutboundMessage::StoppedTyping { user })
            } else {
                None
            };

            if let Some(signal) = signal {
                if let Err(e) = self.transmit(&signal) {
                    debug!("typing signal not delivered: {e}");
                }
            }
        }

        self.publish();
    }

    /// End the conversation.
    pub fn end_chat(&mut self) -> Result<()> {
        self.ensure_live()?;
        let can_end = self.machine.can_transition(&PhaseEvent::EndRequested);
        let identity = match (&self.identity, can_end) {
            (Some(identity), true) => identity.clone(),
            _ => {
                self.raise_notice(NOT_IN_CHAT_NOTICE);
                return Err(SessionError::NotMatched);
            }
        };

        if let Err(e) = self.transmit(&OutboundMessage::Close { user: identity }) {
            warn!("close message not delivered: {e}");
        }
        self.finish(PhaseEvent::EndRequested);
        self.notice = None;
        self.publish();
        Ok(())
    }

    /// Release the connection. Safe to call in any phase, any number of
    /// times; nothing is processed afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.peer_typing = false;
        self.close_connection();
        info!("session torn down in phase {}", self.phase());
        self.publish();
    }

    // ========== Channel input ==========

    /// Process something the channel delivered.
    ///
    /// Frames that fail to decode are logged and dropped.
    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        if !self.is_live() {
            debug!("dropping channel event after session end: {event:?}");
            return;
        }

        match event {
            ChannelEvent::Opened => self.on_channel_opened(),
            ChannelEvent::Frame(text) => match protocol::decode(&text) {
                Ok(message) => self.handle_inbound(message),
                Err(e) => warn!("dropping malformed frame: {e} - raw: {text}"),
            },
            ChannelEvent::Closed { reason } => {
                info!(
                    "connection closed by relay: {}",
                    reason.as_deref().unwrap_or("no reason given")
                );
                self.finish(PhaseEvent::ChannelLost { reason });
                self.publish();
            }
        }
    }

    /// Apply a decoded relay message.
    pub fn handle_inbound(&mut self, message: InboundMessage) {
        if !self.is_live() {
            debug!("dropping inbound message after session end");
            return;
        }

        match message {
            InboundMessage::Message { user, content } => {
                if self.config.dedupe_own_echo && self.identity.as_ref() == Some(&user) {
                    debug!("dropping echo of own message");
                    return;
                }
                self.transcript.push(ChatMessage::new(user, content));
                self.peer_typing = false;
            }
            InboundMessage::Match => match self.machine.apply(PhaseEvent::MatchFound) {
                Ok(transition) if transition.changed => {
                    info!("matched with a stranger");
                    self.notice = None;
                }
                Ok(_) => debug!("already matched"),
                Err(e) => {
                    debug!("ignoring match: {e}");
                    return;
                }
            },
            InboundMessage::Close => {
                info!("stranger ended the chat");
                self.finish(PhaseEvent::PeerClosed);
            }
            InboundMessage::Typing => self.peer_typing = true,
            InboundMessage::StoppedTyping => self.peer_typing = false,
            InboundMessage::Unknown => {
                debug!("ignoring unrecognized message type");
                return;
            }
        }

        self.publish();
    }

    // ========== Internals ==========

    fn on_channel_opened(&mut self) {
        if self.phase() != SessionPhase::Joining {
            debug!("ignoring open notification while {}", self.phase());
            return;
        }
        let Some(user) = self.identity.clone() else {
            return;
        };

        match self.transmit(&OutboundMessage::Join { user }) {
            Ok(()) => {
                self.machine.handle_event(PhaseEvent::ChannelOpened);
                info!("joined relay, waiting for a match");
            }
            Err(e) => warn!("join message not delivered: {e}"),
        }
        self.publish();
    }

    /// Encode and queue a message. A dead connection ends the session.
    fn transmit(&mut self, message: &OutboundMessage) -> Result<()> {
        let frame = protocol::encode(message)?;
        let Some(connection) = self.connection.as_mut() else {
            return Err(ChannelError::Closed.into());
        };

        if let Err(e) = connection.send(frame) {
            warn!("failed to send {} message: {e}", message.kind());
            self.finish(PhaseEvent::ChannelLost {
                reason: Some(e.to_string()),
            });
            return Err(e.into());
        }

        debug!("sent {} message", message.kind());
        Ok(())
    }

    /// Move to `Ended` and release the connection.
    fn finish(&mut self, event: PhaseEvent) {
        debug_assert!(event.is_terminating(), "{} does not end a session", event.name());
        self.machine.handle_event(event);
        self.peer_typing = false;
        self.close_connection();
    }

    fn close_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            debug!("connection closed");
        }
    }

    fn is_live(&self) -> bool {
        !self.torn_down && !self.phase().is_terminal()
    }

    fn ensure_not_torn_down(&self) -> Result<()> {
        if self.torn_down {
            Err(SessionError::TornDown)
        } else {
            Ok(())
        }
    }

    fn ensure_live(&self) -> Result<()> {
        self.ensure_not_torn_down()?;
        if self.phase().is_terminal() {
            return Err(SessionError::SessionEnded);
        }
        Ok(())
    }

    fn raise_notice(&mut self, notice: &str) {
        self.notice = Some(notice.to_string());
        self.notice_seq += 1;
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

impl<C: Connector> Drop for SessionController<C> {
    fn drop(&mut self) {
        self.close_connection();
    }
}

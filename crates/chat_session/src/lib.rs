//! chat_session - Session controller for the stranger chat client
//!
//! The controller is the single owner of the session phase, transcript,
//! typing signal and connection. Everything the relay sends goes through
//! [`SessionController::handle_channel_event`]; everything the user does
//! goes through the controller's operations. Shells read state from
//! [`SessionSnapshot`] values.
//!
//! - `protocol` - JSON messages exchanged with the relay
//! - `channel` - Connector/connection seam plus websocket and in-memory channels
//! - `controller` - The session controller
//! - `driver` - Async loop feeding intents and channel events into a controller

pub mod channel;
pub mod controller;
pub mod driver;
pub mod error;
pub mod protocol;

// Re-export commonly used types
pub use channel::{ChannelEvent, Connection, Connector, MemoryConnector, MemoryHandle, WsConnector};
pub use controller::{SessionController, SessionSnapshot};
pub use driver::{SessionDriver, UserIntent};
pub use error::{ChannelError, Result, SessionError};
pub use protocol::{InboundMessage, OutboundMessage};

pub use chat_state::SessionPhase;

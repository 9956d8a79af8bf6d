//! Channel seam - the bidirectional connection to the relay
//!
//! A [`Connector`] opens one [`Connection`] per session. Connections are
//! fire-and-forget for outbound frames; everything that comes back from the
//! relay (open notification, text frames, closure) is reported as a
//! [`ChannelEvent`] on a channel the connector was built with.

mod memory;
mod websocket;

pub use memory::{MemoryConnector, MemoryHandle};
pub use websocket::WsConnector;

use url::Url;

use crate::error::ChannelError;

/// What a channel reports back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The connection is established and frames can flow.
    Opened,
    /// A text frame arrived.
    Frame(String),
    /// The connection closed, cleanly or not.
    Closed { reason: Option<String> },
}

/// An open (or opening) connection to the relay.
pub trait Connection: Send {
    /// Queue a text frame for delivery. Does not wait for the relay.
    fn send(&mut self, frame: String) -> Result<(), ChannelError>;

    /// Close the connection. Later calls have no effect.
    fn close(&mut self);
}

/// Opens connections to the relay.
pub trait Connector {
    fn open(&mut self, endpoint: &Url) -> Result<Box<dyn Connection>, ChannelError>;
}

//! In-memory loopback channel.
//!
//! Records every frame the session sends and lets the holder of the
//! [`MemoryHandle`] play the relay's part. Useful for tests and offline demos.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use url::Url;

use super::{ChannelEvent, Connection, Connector};
use crate::error::ChannelError;

#[derive(Debug, Default)]
struct MemoryState {
    endpoints: Vec<Url>,
    sent: Vec<String>,
    close_calls: usize,
    open: bool,
    fail_next_open: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Shared(Arc<Mutex<MemoryState>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Connector whose connections live in memory.
pub struct MemoryConnector {
    shared: Shared,
    events: Option<mpsc::UnboundedSender<ChannelEvent>>,
}

impl MemoryConnector {
    /// Connector without an event channel; the caller feeds channel events
    /// to the controller directly.
    pub fn new() -> (Self, MemoryHandle) {
        let shared = Shared::default();
        let handle = MemoryHandle {
            shared: shared.clone(),
            events: None,
        };
        (Self { shared, events: None }, handle)
    }

    /// Connector that reports `Opened` on open and lets the handle deliver
    /// frames through `events`.
    pub fn with_events(events: mpsc::UnboundedSender<ChannelEvent>) -> (Self, MemoryHandle) {
        let shared = Shared::default();
        let handle = MemoryHandle {
            shared: shared.clone(),
            events: Some(events.clone()),
        };
        (
            Self {
                shared,
                events: Some(events),
            },
            handle,
        )
    }
}

impl Connector for MemoryConnector {
    fn open(&mut self, endpoint: &Url) -> Result<Box<dyn Connection>, ChannelError> {
        let mut state = self.shared.lock();
        if let Some(error) = state.fail_next_open.take() {
            return Err(ChannelError::Connect(error));
        }
        state.endpoints.push(endpoint.clone());
        state.open = true;
        drop(state);

        if let Some(events) = &self.events {
            let _ = events.send(ChannelEvent::Opened);
        }

        Ok(Box::new(MemoryConnection {
            shared: self.shared.clone(),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    shared: Shared,
    closed: bool,
}

impl Connection for MemoryConnection {
    fn send(&mut self, frame: String) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.shared.lock().sent.push(frame);
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.shared.lock();
        state.close_calls += 1;
        state.open = false;
        self.closed = true;
    }
}

/// The relay's side of a [`MemoryConnector`].
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    shared: Shared,
    events: Option<mpsc::UnboundedSender<ChannelEvent>>,
}

impl MemoryHandle {
    /// Endpoints passed to every successful `open`, in order.
    pub fn endpoints(&self) -> Vec<Url> {
        self.shared.lock().endpoints.clone()
    }

    /// Number of connections opened so far.
    pub fn open_count(&self) -> usize {
        self.shared.lock().endpoints.len()
    }

    /// Raw frames sent by the session, in order.
    pub fn sent_frames(&self) -> Vec<String> {
        self.shared.lock().sent.clone()
    }

    /// Sent frames parsed as JSON values. Unparseable frames are skipped.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent_frames()
            .iter()
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }

    /// How many times `close` was called on any connection.
    pub fn close_calls(&self) -> usize {
        self.shared.lock().close_calls
    }

    pub fn is_open(&self) -> bool {
        self.shared.lock().open
    }

    /// Make the next `open` fail with `error`.
    pub fn fail_next_open(&self, error: impl Into<String>) {
        self.shared.lock().fail_next_open = Some(error.into());
    }

    /// Deliver a frame to the session. Returns false without an event channel
    /// or once the receiver is gone.
    pub fn deliver(&self, frame: impl Into<String>) -> bool {
        self.emit(ChannelEvent::Frame(frame.into()))
    }

    /// Simulate the relay dropping the connection.
    pub fn drop_connection(&self, reason: Option<String>) -> bool {
        self.shared.lock().open = false;
        self.emit(ChannelEvent::Closed { reason })
    }

    fn emit(&self, event: ChannelEvent) -> bool {
        match &self.events {
            Some(events) => events.send(event).is_ok(),
            None => false,
        }
    }
}

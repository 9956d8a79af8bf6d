//! Websocket channel over `tokio-tungstenite`.
//!
//! Each connection runs a background task that multiplexes outbound frames,
//! inbound frames and the close signal with `tokio::select!`.

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use super::{ChannelEvent, Connection, Connector};
use crate::error::ChannelError;

/// Opens websocket connections and reports their events on `events`.
///
/// `open` must be called from within a tokio runtime.
pub struct WsConnector {
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl WsConnector {
    pub fn new(events: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        Self { events }
    }
}

impl Connector for WsConnector {
    fn open(&mut self, endpoint: &Url) -> Result<Box<dyn Connection>, ChannelError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ChannelError::Connect(format!("no async runtime: {e}")))?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();

        runtime.spawn(connection_loop(
            endpoint.clone(),
            outbound_rx,
            close_rx,
            self.events.clone(),
        ));

        Ok(Box::new(WsConnection {
            outbound: outbound_tx,
            close: Some(close_tx),
        }))
    }
}

/// Handle to a websocket connection task.
///
/// Dropping the handle closes the connection.
struct WsConnection {
    outbound: mpsc::UnboundedSender<String>,
    close: Option<oneshot::Sender<()>>,
}

impl Connection for WsConnection {
    fn send(&mut self, frame: String) -> Result<(), ChannelError> {
        if self.close.is_none() {
            return Err(ChannelError::Closed);
        }
        self.outbound.send(frame).map_err(|_| ChannelError::Closed)
    }

    fn close(&mut self) {
        if let Some(close) = self.close.take() {
            let _ = close.send(());
        }
    }
}

/// Background task owning the websocket stream.
///
/// Exits when:
/// - The close signal fires or the handle is dropped
/// - The relay closes the connection
/// - A transport error occurs
async fn connection_loop(
    endpoint: Url,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut close_rx: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    let report = |event: ChannelEvent| {
        if events.send(event).is_err() {
            debug!("channel event receiver dropped");
        }
    };

    let ws = tokio::select! {
        connected = connect_async(endpoint.as_str()) => match connected {
            Ok((ws, _response)) => ws,
            Err(e) => {
                warn!("websocket connect to {endpoint} failed: {e}");
                report(ChannelEvent::Closed {
                    reason: Some(format!("connect failed: {e}")),
                });
                return;
            }
        },
        _ = &mut close_rx => {
            debug!("connection closed before it was established");
            return;
        }
    };

    info!("websocket connection established: {endpoint}");
    report(ChannelEvent::Opened);

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            // Outbound first: a frame queued before `close` must still go out.
            biased;

            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!("websocket send failed: {e}");
                        report(ChannelEvent::Closed { reason: Some(e.to_string()) });
                        break;
                    }
                }
                // Connection handle dropped.
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },

            _ = &mut close_rx => {
                debug!("closing websocket connection");
                while let Ok(text) = outbound.try_recv() {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!("websocket send failed while closing: {e}");
                        break;
                    }
                }
                let _ = sink.close().await;
                break;
            }

            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    report(ChannelEvent::Frame(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|reason| !reason.is_empty());
                    info!("relay closed the websocket");
                    report(ChannelEvent::Closed { reason });
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("websocket receive failed: {e}");
                    report(ChannelEvent::Closed { reason: Some(e.to_string()) });
                    break;
                }
                None => {
                    report(ChannelEvent::Closed { reason: None });
                    break;
                }
            }
        }
    }

    debug!("websocket connection loop exited");
}

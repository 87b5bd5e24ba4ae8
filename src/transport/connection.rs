//! WebSocket connection and event loop.
//!
//! This module owns the single WebSocket connection to the runtime under
//! test.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming text frames, forwarded in arrival order to one inbound channel
//! - Outgoing frames from the Rust API, acknowledged once written
//! - Graceful close: send a close frame, wait for the runtime's acknowledgment
//!
//! Frames are consumed one at a time through [`Connection::recv_frame`].
//! Receiving is cancel-safe: a scenario that stops waiting leaves the
//! connection and any buffered frames intact for the next scenario.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Maximum time to wait for the runtime to acknowledge a close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capability tokens advertised by the runtime, e.g. `protocol:graph`.
pub type Capabilities = FxHashSet<String>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection has been attempted.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// Handshake completed; frames flow both ways.
    Connected,
    /// Close frame sent, waiting for acknowledgment.
    Closing,
    /// Connection is gone.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a text frame.
    Send {
        text: String,
        ack: oneshot::Sender<Result<()>>,
    },
    /// Close gracefully and report once acknowledged.
    Close { done: oneshot::Sender<()> },
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to the runtime under test.
///
/// Owned by the [`Supervisor`](super::Supervisor); scenarios borrow it in
/// turn. Not `Clone`: there is exactly one inbound consumer.
pub struct Connection {
    /// Address the connection was opened to.
    url: String,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Inbound text frames in arrival order.
    inbound_rx: mpsc::UnboundedReceiver<String>,
    /// State, shared with the event loop.
    state: Arc<RwLock<ConnectionState>>,
    /// Capabilities, populated once from runtime metadata.
    capabilities: Option<Capabilities>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url)
            .field("state", &self.state())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a new connection from an established WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub(crate) fn new(ws_stream: WsStream, url: impl Into<String>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(ConnectionState::Connected));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            inbound_tx,
            Arc::clone(&state),
        ));

        Self {
            url: url.into(),
            command_tx,
            inbound_rx,
            state,
            capabilities: None,
        }
    }

    /// Returns the address this connection was opened to.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Returns `true` if frames can still be sent.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Records the capabilities advertised by the runtime.
    ///
    /// Only the first call has an effect; returns whether it did.
    pub fn set_capabilities(&mut self, capabilities: impl IntoIterator<Item = String>) -> bool {
        if self.capabilities.is_some() {
            warn!("Capabilities already recorded, ignoring update");
            return false;
        }
        let capabilities: Capabilities = capabilities.into_iter().collect();
        debug!(count = capabilities.len(), "Recorded runtime capabilities");
        self.capabilities = Some(capabilities);
        true
    }

    /// Returns the recorded capabilities, if runtime metadata was received.
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> Option<&Capabilities> {
        self.capabilities.as_ref()
    }

    /// Returns `true` if the runtime advertised `capability`.
    #[inline]
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .as_ref()
            .is_some_and(|caps| caps.contains(capability))
    }

    /// Writes a single text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the event loop has stopped
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send_text(&self, text: String) -> Result<()> {
        let (ack, ack_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send { text, ack })
            .map_err(|_| Error::ConnectionClosed)?;

        ack_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Waits for the next inbound text frame.
    ///
    /// Returns `None` once the connection is closed and every buffered
    /// frame has been consumed.
    pub async fn recv_frame(&mut self) -> Option<String> {
        self.inbound_rx.recv().await
    }

    /// Closes the connection gracefully.
    ///
    /// Sends a close frame and waits for the runtime to acknowledge it.
    /// Does nothing if the connection is not open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the acknowledgment does not arrive.
    pub async fn close(&mut self) -> Result<()> {
        if self.state() != ConnectionState::Connected {
            return Ok(());
        }

        let (done, done_rx) = oneshot::channel();
        if self
            .command_tx
            .send(ConnectionCommand::Close { done })
            .is_err()
        {
            *self.state.write() = ConnectionState::Closed;
            return Ok(());
        }

        match timeout(CLOSE_TIMEOUT, done_rx).await {
            Ok(_) => {
                debug!(url = %self.url, "Connection closed");
                Ok(())
            }
            Err(_) => {
                *self.state.write() = ConnectionState::Closed;
                Err(Error::timeout(
                    "close acknowledgment",
                    CLOSE_TIMEOUT.as_millis() as u64,
                ))
            }
        }
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        inbound_tx: mpsc::UnboundedSender<String>,
        state: Arc<RwLock<ConnectionState>>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut close_waiter: Option<oneshot::Sender<()>> = None;

        loop {
            tokio::select! {
                // Incoming frames from the runtime
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Frame received");
                            if close_waiter.is_none() && inbound_tx.send(text.to_string()).is_err() {
                                debug!("Inbound receiver dropped");
                            }
                        }

                        Some(Ok(Message::Binary(data))) => {
                            warn!(len = data.len(), "Ignoring binary frame");
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            if close_waiter.is_none() {
                                error!(error = %e, "WebSocket error");
                            }
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ping/Pong are answered by tungstenite
                        Some(Ok(_)) => {}
                    }
                }

                // Commands from the Rust API
                command = command_rx.recv(), if close_waiter.is_none() => {
                    match command {
                        Some(ConnectionCommand::Send { text, ack }) => {
                            let result = ws_write
                                .send(Message::Text(text.into()))
                                .await
                                .map_err(Error::from);
                            if let Err(e) = &result {
                                warn!(error = %e, "Failed to send frame");
                            }
                            let _ = ack.send(result);
                        }

                        Some(ConnectionCommand::Close { done }) => {
                            debug!("Close requested");
                            *state.write() = ConnectionState::Closing;
                            if let Err(e) = ws_write.close().await {
                                debug!(error = %e, "Failed to send close frame");
                                let _ = done.send(());
                                break;
                            }
                            close_waiter = Some(done);
                        }

                        None => {
                            debug!("Command channel closed");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        *state.write() = ConnectionState::Closed;
        if let Some(done) = close_waiter {
            let _ = done.send(());
        }

        debug!("Event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================

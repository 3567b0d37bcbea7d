//! Outbound socket channel and connection state machine.
//!
//! One [`SocketChannel`] owns one outbound WebSocket connection to the
//! desktop endpoint. The channel tracks its lifecycle in a
//! [`ConnectionState`] machine and never retries on its own; reconnection
//! policy is driven externally by the
//! [`ReconnectionSupervisor`](super::supervisor::ReconnectionSupervisor).
//!
//! # State Machine
//!
//! ```text
//!                connect()                 transport open
//! Disconnected ─────────────► Connecting ─────────────────► Connected
//!      ▲                          │                             │
//!      └──────────────────────────┴─────────────────────────────┘
//!                     transport close / error / connect failure
//! ```
//!
//! Delivery semantics are at-most-once and fire-and-forget: `send` silently
//! drops unless Connected and never buffers for later delivery. Inbound
//! payloads that fail to parse are logged and dropped without disturbing the
//! connection. The fault that ended the most recent attempt or session is
//! retained and observable through [`SocketChannel::take_last_error`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::protocol::Message;

// ============================================================================
// Types
// ============================================================================

/// Handler for decoded inbound messages.
///
/// A channel has at most one; messages arriving without a handler are
/// dropped. There is no fallback queue.
pub type MessageHandler = Box<dyn Fn(Message) + Send + Sync>;

/// The underlying transport stream.
type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Socket lifecycle state.
///
/// Exactly one current value per channel. Transitions happen only inside the
/// channel's lifecycle handling; consumers read but never set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport. Initial state, and terminal on any failure.
    #[default]
    Disconnected,

    /// A connection attempt is in flight.
    Connecting,

    /// The transport is open.
    Connected,
}

// ============================================================================
// SocketChannel
// ============================================================================

/// One outbound connection to the desktop endpoint.
///
/// Cheap to clone; clones share the same state machine and transport.
pub struct SocketChannel {
    /// Endpoint URL (`ws://127.0.0.1:{port}`).
    endpoint: String,

    /// Current lifecycle state.
    state: Arc<Mutex<ConnectionState>>,

    /// Sender into the write half of the live transport, when Connected.
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,

    /// Registered inbound message handler.
    handler: Arc<Mutex<Option<MessageHandler>>>,

    /// Fault that ended the most recent connection attempt or session.
    last_error: Arc<Mutex<Option<Error>>>,
}

impl Clone for SocketChannel {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            state: Arc::clone(&self.state),
            outbound: Arc::clone(&self.outbound),
            handler: Arc::clone(&self.handler),
            last_error: Arc::clone(&self.last_error),
        }
    }
}

impl SocketChannel {
    /// Creates a channel for the configured endpoint. Does not connect.
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        Self::with_endpoint(config.endpoint_url())
    }

    /// Creates a channel for an explicit endpoint URL. Does not connect.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            outbound: Arc::new(Mutex::new(None)),
            handler: Arc::new(Mutex::new(None)),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Takes the fault that ended the most recent connection, if any.
    ///
    /// `None` after a clean local shutdown or while nothing has failed yet.
    /// Faults report through here instead of a return value because both
    /// connecting and disconnecting happen on the channel's own task.
    #[must_use]
    pub fn take_last_error(&self) -> Option<Error> {
        self.last_error.lock().take()
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Sets the inbound message handler, replacing any previous one.
    pub fn set_message_handler(&self, handler: MessageHandler) {
        *self.handler.lock() = Some(handler);
    }

    /// Clears the inbound message handler.
    pub fn clear_message_handler(&self) {
        *self.handler.lock() = None;
    }

    /// Opens the transport, if currently Disconnected.
    ///
    /// Valid only from Disconnected; while Connecting or Connected the call
    /// is a no-op, so a racing caller cannot create a second transport. The
    /// attempt itself runs on a spawned task: failure to connect reports
    /// through logging and resets to Disconnected, never panics.
    pub fn connect(&self) {
        {
            let mut state = self.state.lock();
            if *state != ConnectionState::Disconnected {
                trace!(state = ?*state, "connect ignored; transport already active");
                return;
            }
            *state = ConnectionState::Connecting;
        }

        let endpoint = self.endpoint.clone();
        let state = Arc::clone(&self.state);
        let outbound = Arc::clone(&self.outbound);
        let handler = Arc::clone(&self.handler);
        let last_error = Arc::clone(&self.last_error);

        tokio::spawn(async move {
            let transport = match connect_async(&endpoint).await {
                Ok((transport, _response)) => transport,
                Err(error) => {
                    let error = Error::connection(error.to_string());
                    debug!(%error, endpoint, "connection attempt failed");
                    *last_error.lock() = Some(error);
                    *state.lock() = ConnectionState::Disconnected;
                    return;
                }
            };

            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            *outbound.lock() = Some(outbound_tx);
            *state.lock() = ConnectionState::Connected;
            debug!(endpoint, "connected to desktop endpoint");

            let outcome = Self::run_transport(transport, outbound_rx, &handler).await;

            // Transport released on every exit path: close, error, or a
            // stream that simply ended. The fault is recorded before the
            // state flips so observers never see Disconnected without it.
            *outbound.lock() = None;
            match outcome {
                Ok(()) => debug!(endpoint, "disconnected from desktop endpoint"),
                Err(error) if error.is_recoverable() => {
                    debug!(%error, endpoint, "connection lost");
                    *last_error.lock() = Some(error);
                }
                Err(error) => {
                    warn!(%error, endpoint, "connection failed");
                    *last_error.lock() = Some(error);
                }
            }
            *state.lock() = ConnectionState::Disconnected;
        });
    }

    /// Sends a message, if Connected.
    ///
    /// At-most-once: in any other state the message is silently dropped,
    /// never buffered.
    pub fn send(&self, message: &Message) {
        if self.state() != ConnectionState::Connected {
            trace!(
                message_type = message.message_type(),
                "send dropped; not connected"
            );
            return;
        }

        let text = match message.encode() {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "outbound message failed to serialize");
                return;
            }
        };

        if let Some(outbound) = self.outbound.lock().as_ref() {
            // A send error means the transport task already exited; the
            // state reset happens there.
            let _ = outbound.send(text);
        }
    }

    /// Pumps the live transport until it closes or errors.
    ///
    /// `Ok` only for a clean local shutdown. A remote close or an ended
    /// stream reports as [`Error::ConnectionClosed`]; transport faults as
    /// [`Error::WebSocket`].
    async fn run_transport(
        transport: Transport,
        mut outbound_rx: mpsc::UnboundedReceiver<String>,
        handler: &Arc<Mutex<Option<MessageHandler>>>,
    ) -> Result<()> {
        let (mut ws_write, mut ws_read) = transport.split();

        let outcome = loop {
            tokio::select! {
                frame = ws_read.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            Self::handle_incoming(&text, handler);
                        }

                        Some(Ok(WsMessage::Close(_))) => {
                            debug!("transport closed by remote");
                            break Err(Error::ConnectionClosed);
                        }

                        Some(Err(error)) => break Err(error.into()),

                        None => {
                            debug!("transport stream ended");
                            break Err(Error::ConnectionClosed);
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                outgoing = outbound_rx.recv() => {
                    match outgoing {
                        Some(text) => {
                            if let Err(error) = ws_write.send(WsMessage::Text(text.into())).await {
                                break Err(error.into());
                            }
                        }
                        None => break Ok(()),
                    }
                }
            }
        };

        // Force-close on the error paths as well; a failure here is moot.
        let _ = ws_write.close().await;
        outcome
    }

    /// Decodes and delivers one inbound payload.
    ///
    /// Parse failures are logged and dropped; the connection stays usable.
    fn handle_incoming(text: &str, handler: &Arc<Mutex<Option<MessageHandler>>>) {
        match Message::decode(text) {
            Ok(message) => {
                let guard = handler.lock();
                match guard.as_ref() {
                    Some(handler) => handler(message),
                    None => trace!("inbound message dropped; no handler registered"),
                }
            }
            Err(error) => {
                warn!(%error, payload = text, "malformed inbound payload dropped");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

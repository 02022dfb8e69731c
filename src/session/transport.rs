use std::fmt;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// Errors a transport reports when emitting.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// No live channel (never connected, or the link dropped).
    NotConnected,
    /// Network-level failure (timeout, DNS, connection refused, HTTP status).
    Network(String),
    /// The peer sent something the codec could not make sense of.
    Protocol(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotConnected => write!(f, "transport not connected"),
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Protocol(msg) => write!(f, "protocol error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Lifecycle and message events pushed by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Handshake completed; the channel can carry questions.
    Connected,
    /// The channel closed. Carries the reason reported by the transport.
    Disconnected(String),
    /// A connection attempt failed.
    ConnectError(String),
    /// An inbound event with its first argument.
    Message { event: String, payload: Value },
}

/// Where a transport delivers its events. Cheap to clone.
#[derive(Clone)]
pub struct EventSink {
    tx: UnboundedSender<TransportEvent>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<TransportEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event. Returns false once nobody is listening anymore.
    pub fn send(&self, event: TransportEvent) -> bool {
        if self.tx.send(event).is_err() {
            debug!("Transport event dropped: session closed");
            return false;
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A duplex channel to the assistant service.
///
/// Implementations own reconnection. The session manager only reacts to the
/// events pushed into the sink.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Start connecting. Returns immediately; progress arrives through `sink`.
    fn connect(&self, sink: EventSink);

    /// Send one event with a JSON payload.
    async fn emit(&self, event: &str, payload: Value) -> Result<(), TransportError>;

    /// Close the channel and stop any reconnect attempts.
    async fn disconnect(&self);
}

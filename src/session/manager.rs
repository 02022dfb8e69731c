//! # Session Manager
//!
//! Owns the chat channel for the lifetime of one chat screen and pairs each
//! question with the next answer.
//!
//! ```text
//! SessionManager
//! ├── transport: Arc<dyn Transport>    // injected duplex channel
//! ├── state: watch::Sender<...>        // Connecting / Connected / Disconnected / Error
//! ├── listener: ListenerSlot           // at most one one-shot answer listener
//! └── dispatcher: JoinHandle           // transport events → state + listener
//! ```
//!
//! The transport multiplexes every answer onto one `message` event with no
//! request id, so pairing relies on there being a single question in flight.
//! `ask` enforces that: a second question while one is pending fails with
//! [`SessionError::Busy`] instead of racing the first one for its answer.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::payload::{self, MESSAGE_EVENT, QuestionPayload};
use super::transport::{EventSink, Transport, TransportEvent};

/// How long `ask` waits for an answer unless configured otherwise.
pub const DEFAULT_ANSWER_TIMEOUT: Duration = Duration::from_secs(30);

/// Health of the chat channel, for display. Only transport events move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Error => "error",
        }
    }
}

/// Why a question did not get an answer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Question was empty after trimming. Nothing was sent.
    EmptyQuestion,
    /// The channel is not in the Connected state. Nothing was sent.
    NotConnected,
    /// Another question is still waiting for its answer. Nothing was sent.
    Busy,
    /// No answer arrived within the window.
    Timeout(Duration),
    /// Emitting failed, or the answer payload could not be decoded.
    Transport(String),
    /// The session was closed while the question was in flight.
    Closed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyQuestion => write!(f, "question is empty"),
            SessionError::NotConnected => write!(f, "chat channel not connected"),
            SessionError::Busy => write!(f, "a question is already waiting for an answer"),
            SessionError::Timeout(after) => write!(f, "no answer after {}s", after.as_secs()),
            SessionError::Transport(msg) => write!(f, "transport error: {msg}"),
            SessionError::Closed => write!(f, "chat session closed"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub answer_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            answer_timeout: DEFAULT_ANSWER_TIMEOUT,
        }
    }
}

// ============================================================================
// Listener slot
// ============================================================================

/// A one-shot answer listener, tagged with the request it belongs to.
struct Listener {
    request_id: String,
    tx: oneshot::Sender<Value>,
}

/// Holds at most one listener. Shared between `ask` and the dispatcher.
#[derive(Clone, Default)]
struct ListenerSlot(Arc<Mutex<Option<Listener>>>);

impl ListenerSlot {
    /// Install a listener for `request_id`. Fails if one is already installed.
    fn register(&self, request_id: &str) -> Result<(ListenerGuard, oneshot::Receiver<Value>), SessionError> {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(SessionError::Busy);
        }
        let (tx, rx) = oneshot::channel();
        *slot = Some(Listener {
            request_id: request_id.to_string(),
            tx,
        });
        let guard = ListenerGuard {
            slot: self.clone(),
            request_id: request_id.to_string(),
        };
        Ok((guard, rx))
    }

    /// Hand an inbound answer to the listener, consuming it.
    /// Answers echoing another request's id are left for their owner.
    fn deliver(&self, raw: Value) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(listener) = slot.take() else {
            debug!("Answer arrived with no question in flight, dropping it");
            return;
        };

        if let Some(echoed) = payload::echoed_request_id(&raw)
            && echoed != listener.request_id
        {
            debug!(
                "Ignoring answer for request {} while waiting on {}",
                echoed, listener.request_id
            );
            *slot = Some(listener);
            return;
        }

        if listener.tx.send(raw).is_err() {
            debug!("Listener for {} gave up before the answer arrived", listener.request_id);
        }
    }

    /// Remove the listener if it still belongs to `request_id`.
    fn remove(&self, request_id: &str) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|l| l.request_id == request_id) {
            *slot = None;
        }
    }

    /// Drop whatever listener is installed; its `ask` sees the session closing.
    fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    fn is_occupied(&self) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

/// Unregisters the listener when the `ask` that owns it finishes or is dropped.
struct ListenerGuard {
    slot: ListenerSlot,
    request_id: String,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.slot.remove(&self.request_id);
    }
}

// ============================================================================
// Session manager
// ============================================================================

pub struct SessionManager {
    transport: Arc<dyn Transport>,
    settings: SessionSettings,
    state: watch::Sender<ConnectionState>,
    listener: ListenerSlot,
    dispatcher: JoinHandle<()>,
}

impl SessionManager {
    /// Open a session: ask the transport to connect and start following its
    /// events. Must be called inside a tokio runtime.
    pub fn open(transport: Arc<dyn Transport>, settings: SessionSettings) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let listener = ListenerSlot::default();

        info!("Opening chat session over {}", transport.name());
        let dispatcher = tokio::spawn(dispatch(event_rx, state.clone(), listener.clone()));
        transport.connect(EventSink::new(event_tx));

        Self {
            transport,
            settings,
            state,
            listener,
            dispatcher,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Follow connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// True while a question is waiting for its answer.
    pub fn has_pending_question(&self) -> bool {
        self.listener.is_occupied()
    }

    /// Send a question and wait for the next answer.
    ///
    /// Emits exactly one event on success and never retries. The listener is
    /// removed on every outcome, including this future being dropped.
    pub async fn ask(&self, requester_id: &str, question: &str) -> Result<String, SessionError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        if self.state() != ConnectionState::Connected {
            warn!("Refusing to ask while {}", self.state().label());
            return Err(SessionError::NotConnected);
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        let (_guard, answer_rx) = self.listener.register(&request_id)?;

        let question = QuestionPayload {
            requester_id: requester_id.to_string(),
            question: question.to_string(),
            request_id: request_id.clone(),
        };
        let body = serde_json::to_value(&question).map_err(|e| SessionError::Transport(e.to_string()))?;

        // The answer window opens before the emit, so a stalled send times out too
        let timeout = self.settings.answer_timeout;
        let deadline = tokio::time::Instant::now() + timeout;
        let exchange = async {
            self.transport.emit(MESSAGE_EVENT, body).await.map_err(|e| {
                warn!("Emit failed for request {}: {}", request_id, e);
                SessionError::Transport(e.to_string())
            })?;
            info!("Question emitted (request {}, {} chars)", request_id, question.question.len());
            answer_rx.await.map_err(|_| SessionError::Closed)
        };

        let raw = match tokio::time::timeout_at(deadline, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("No answer for request {} after {:?}", request_id, timeout);
                return Err(SessionError::Timeout(timeout));
            }
        };

        let decoded = payload::decode(raw).map_err(|e| {
            warn!("Answer for request {} could not be decoded: {}", request_id, e);
            SessionError::Transport(e)
        })?;
        let answer = payload::answer_text(&decoded);
        info!("Answer received (request {}, {} chars)", request_id, answer.len());
        Ok(answer)
    }

    /// Tear the session down: disconnect the transport, stop following its
    /// events and fail any question still in flight with `Closed`.
    /// Later questions fail with `NotConnected`.
    pub async fn close(&self) {
        info!("Closing chat session");
        self.dispatcher.abort();
        self.listener.clear();
        self.transport.disconnect().await;
        self.state.send_replace(ConnectionState::Disconnected);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// Follow transport events until the transport goes away.
async fn dispatch(
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    state: watch::Sender<ConnectionState>,
    listener: ListenerSlot,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Connected => {
                info!("Chat channel connected");
                state.send_replace(ConnectionState::Connected);
            }
            TransportEvent::Disconnected(reason) => {
                info!("Chat channel disconnected: {}", reason);
                state.send_replace(ConnectionState::Disconnected);
            }
            TransportEvent::ConnectError(message) => {
                warn!("Chat channel connection failed: {}", message);
                state.send_replace(ConnectionState::Error);
            }
            TransportEvent::Message { event, payload } if event == MESSAGE_EVENT => {
                listener.deliver(payload);
            }
            TransportEvent::Message { event, .. } => {
                debug!("Ignoring inbound event '{}'", event);
            }
        }
    }
    debug!("Transport event stream ended");
}

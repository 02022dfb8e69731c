//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::identity::UserRecord;
use crate::session::{EventSink, Transport, TransportError, TransportEvent};

#[derive(Default)]
struct Script {
    sink: Option<EventSink>,
    emitted: Vec<(String, Value)>,
    reply: Option<Value>,
    fail_emits: bool,
    stall_emits: bool,
    connect_calls: usize,
    disconnect_calls: usize,
}

/// An in-memory transport driven by the test.
///
/// Records every emit and lets the test push events into the session. With
/// `reply_with`, each emit is answered immediately with the given payload.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event into the session, as the network would.
    pub fn fire(&self, event: TransportEvent) {
        let sink = self.script.lock().unwrap().sink.clone();
        sink.expect("fire() before connect()").send(event);
    }

    /// Answer every following emit with `payload`.
    pub fn reply_with(&self, payload: Value) {
        self.script.lock().unwrap().reply = Some(payload);
    }

    /// Make every following emit fail.
    pub fn fail_emits(&self) {
        self.script.lock().unwrap().fail_emits = true;
    }

    /// Make every following emit record its event and then never finish,
    /// like a send stuck on a dead connection.
    pub fn stall_emits(&self) {
        self.script.lock().unwrap().stall_emits = true;
    }

    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.script.lock().unwrap().emitted.clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.script.lock().unwrap().connect_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        self.script.lock().unwrap().disconnect_calls
    }

    /// Yield until at least `count` events have been emitted.
    pub async fn wait_for_emits(&self, count: usize) {
        while self.emitted().len() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn connect(&self, sink: EventSink) {
        let mut script = self.script.lock().unwrap();
        script.connect_calls += 1;
        script.sink = Some(sink);
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<(), TransportError> {
        let stall = {
            let mut script = self.script.lock().unwrap();
            if script.fail_emits {
                return Err(TransportError::Network("connection reset".into()));
            }
            script.emitted.push((event.to_string(), payload));
            if let (Some(reply), Some(sink)) = (script.reply.clone(), script.sink.as_ref()) {
                sink.send(TransportEvent::Message {
                    event: event.to_string(),
                    payload: reply,
                });
            }
            script.stall_emits
        };
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.script.lock().unwrap().disconnect_calls += 1;
    }
}

/// A signed-in test user.
pub fn test_user() -> UserRecord {
    UserRecord {
        id: 1,
        user_id: "TEST001".to_string(),
        name: "Asha".to_string(),
        role: "farmer".to_string(),
        created_at: "2024-01-01T00:00:00".to_string(),
    }
}

/// Creates a test App signed in as [`test_user`].
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(test_user(), 500)
}

/// Shared handle, the way the session manager expects its transport.
pub fn scripted() -> Arc<ScriptedTransport> {
    Arc::new(ScriptedTransport::new())
}

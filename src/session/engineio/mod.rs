//! # Engine.IO Polling Transport
//!
//! A Socket.IO v5 client over Engine.IO v4 HTTP long-polling, joined to one
//! namespace. No websocket upgrade.
//!
//! ```text
//! GET  /socket.io/?EIO=4&transport=polling          → 0{sid,...}
//! POST /socket.io/?EIO=4&transport=polling&sid=..   ← 40/chat,
//! GET  ...&sid=..                                   → 40/chat,{sid} | 44/chat,{message}
//! loop:
//!   GET  ...&sid=..   → 2 (ping) | 42/chat,["message",...] | 1 (close)
//!   POST ...&sid=..   ← 3 (pong) | 42/chat,["message",{...}]
//! ```
//!
//! A background worker owns the handshake, the poll loop and reconnection.
//! Dropped links are retried up to `ReconnectPolicy::attempts` times in a row,
//! `delay` apart; a server-side namespace disconnect is final.

mod packet;

pub use packet::{EnginePacket, OpenInfo, PacketError, SocketPacket, decode_payload};

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::task::JoinHandle;

use super::transport::{EventSink, Transport, TransportError, TransportEvent};

/// Path the Socket.IO server is mounted on.
const SOCKET_PATH: &str = "/socket.io/";

/// Extra allowance on top of the server's ping window for a long-poll GET.
const POLL_SLACK: Duration = Duration::from_secs(5);

/// How the worker retries a lost or refused connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Consecutive failed attempts before giving up.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
    /// Upper bound on one handshake (open + namespace join).
    pub connect_timeout: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(2000),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

pub struct EngineIoTransport {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// State shared with the background worker.
struct Shared {
    client: reqwest::Client,
    endpoint: String,
    namespace: String,
    policy: ReconnectPolicy,
    /// Session id of the live link, if any.
    sid: Mutex<Option<String>>,
}

impl EngineIoTransport {
    /// Creates a transport for `base_url` (e.g. `http://localhost:5000`)
    /// joining `namespace` (e.g. `/chat`).
    pub fn new(base_url: &str, namespace: &str, policy: ReconnectPolicy) -> Self {
        let namespace = if namespace.starts_with('/') {
            namespace.to_string()
        } else {
            format!("/{namespace}")
        };
        Self {
            shared: Arc::new(Shared {
                client: reqwest::Client::new(),
                endpoint: format!(
                    "{}{}?EIO=4&transport=polling",
                    base_url.trim_end_matches('/'),
                    SOCKET_PATH
                ),
                namespace,
                policy,
                sid: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// True while a handshake-complete link is up.
    pub fn is_linked(&self) -> bool {
        self.shared.current_sid().is_some()
    }
}

#[async_trait]
impl Transport for EngineIoTransport {
    fn name(&self) -> &str {
        "engine.io-polling"
    }

    fn connect(&self, sink: EventSink) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = worker.take() {
            previous.abort();
        }
        *worker = Some(tokio::spawn(run(self.shared.clone(), sink)));
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<(), TransportError> {
        let sid = self.shared.current_sid().ok_or(TransportError::NotConnected)?;
        let packet = SocketPacket::Event {
            namespace: self.shared.namespace.clone(),
            event: event.to_string(),
            args: vec![payload],
        };
        self.shared
            .post(&sid, &[EnginePacket::Message(packet.encode())])
            .await
    }

    async fn disconnect(&self) {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(worker) = worker {
            worker.abort();
        }

        let sid = self.shared.sid.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(sid) = sid {
            let leave = SocketPacket::Disconnect {
                namespace: self.shared.namespace.clone(),
            };
            let packets = [EnginePacket::Message(leave.encode()), EnginePacket::Close];
            if let Err(e) = self.shared.post(&sid, &packets).await {
                debug!("Best-effort close failed: {}", e);
            }
            info!("Engine.IO session {} closed", sid);
        }
    }
}

impl Drop for EngineIoTransport {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take() {
            worker.abort();
        }
    }
}

// ============================================================================
// HTTP plumbing
// ============================================================================

impl Shared {
    fn current_sid(&self) -> Option<String> {
        self.sid.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_sid(&self, sid: Option<String>) {
        *self.sid.lock().unwrap_or_else(PoisonError::into_inner) = sid;
    }

    fn session_url(&self, sid: &str) -> String {
        format!("{}&sid={}", self.endpoint, sid)
    }

    /// GET one polling payload.
    async fn poll(&self, url: &str, timeout: Duration) -> Result<Vec<EnginePacket>, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Polling GET failed: {} - {}", status.as_u16(), body);
            return Err(TransportError::Network(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        decode_payload(&body).map_err(|e| TransportError::Protocol(e.to_string()))
    }

    /// POST packets, joined into one payload. Bounded by the connect timeout.
    async fn post(&self, sid: &str, packets: &[EnginePacket]) -> Result<(), TransportError> {
        let body = packets
            .iter()
            .map(EnginePacket::encode)
            .collect::<Vec<_>>()
            .join(&packet::RECORD_SEPARATOR.to_string());

        let response = self
            .client
            .post(self.session_url(sid))
            .header("Content-Type", "text/plain;charset=UTF-8")
            .body(body)
            .timeout(self.policy.connect_timeout)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Polling POST failed: {}", status.as_u16());
            return Err(TransportError::Network(format!("HTTP {}", status.as_u16())));
        }
        Ok(())
    }

    /// Open an engine session and join the namespace.
    async fn handshake(&self) -> Result<Link, TransportError> {
        let packets = self.poll(&self.endpoint, self.policy.connect_timeout).await?;
        let info = match packets.into_iter().next() {
            Some(EnginePacket::Open(info)) => info,
            other => {
                return Err(TransportError::Protocol(format!(
                    "expected open packet, got {other:?}"
                )));
            }
        };
        debug!(
            "Engine.IO open: sid={} pingInterval={} pingTimeout={}",
            info.sid, info.ping_interval, info.ping_timeout
        );

        let join = SocketPacket::Connect {
            namespace: self.namespace.clone(),
            data: None,
        };
        self.post(&info.sid, &[EnginePacket::Message(join.encode())]).await?;

        let mut link = Link::new(info);
        let url = self.session_url(&link.sid);
        loop {
            let mut packets = self.poll(&url, link.poll_timeout).await?.into_iter();
            while let Some(packet) = packets.next() {
                match packet {
                    EnginePacket::Ping => self.post(&link.sid, &[EnginePacket::Pong]).await?,
                    EnginePacket::Close => {
                        return Err(TransportError::Protocol("closed during handshake".into()));
                    }
                    EnginePacket::Message(raw) => match SocketPacket::decode(&raw) {
                        Ok(SocketPacket::Connect { namespace, .. }) if namespace == self.namespace => {
                            // packets behind the ack belong to the live link
                            link.backlog = packets.collect();
                            return Ok(link);
                        }
                        Ok(SocketPacket::ConnectError { message, .. }) => {
                            return Err(TransportError::Protocol(message));
                        }
                        Ok(other) => debug!("Ignoring {:?} before namespace join", other),
                        Err(e) => return Err(TransportError::Protocol(e.to_string())),
                    },
                    _ => {}
                }
            }
        }
    }

    /// Poll until the link drops. Returns why it ended.
    async fn pump(&self, link: Link, sink: &EventSink) -> LinkEnd {
        let url = self.session_url(&link.sid);
        let mut packets = link.backlog;
        loop {
            if let Some(end) = self.deliver(&link.sid, packets, sink).await {
                return end;
            }
            if sink.is_closed() {
                return LinkEnd::Abandoned;
            }

            packets = match self.poll(&url, link.poll_timeout).await {
                Ok(packets) => packets,
                Err(e) => return LinkEnd::Lost(e.to_string()),
            };
        }
    }

    /// Act on one batch of packets. `Some` when the link has ended.
    async fn deliver(&self, sid: &str, packets: Vec<EnginePacket>, sink: &EventSink) -> Option<LinkEnd> {
        for packet in packets {
            match packet {
                EnginePacket::Ping => {
                    if let Err(e) = self.post(sid, &[EnginePacket::Pong]).await {
                        return Some(LinkEnd::Lost(e.to_string()));
                    }
                }
                EnginePacket::Close => return Some(LinkEnd::Lost("transport close".into())),
                EnginePacket::Message(raw) => match SocketPacket::decode(&raw) {
                    Ok(SocketPacket::Event { namespace, event, mut args })
                        if namespace == self.namespace =>
                    {
                        let payload = if args.is_empty() { Value::Null } else { args.swap_remove(0) };
                        debug!("Inbound '{}' event", event);
                        if !sink.send(TransportEvent::Message { event, payload }) {
                            return Some(LinkEnd::Abandoned);
                        }
                    }
                    Ok(SocketPacket::Disconnect { namespace }) if namespace == self.namespace => {
                        return Some(LinkEnd::ServerDisconnect);
                    }
                    Ok(other) => debug!("Ignoring {:?}", other),
                    Err(e) => warn!("Dropping undecodable packet: {}", e),
                },
                EnginePacket::Open(_) | EnginePacket::Pong | EnginePacket::Noop => {}
            }
        }
        None
    }
}

/// A joined engine session.
struct Link {
    sid: String,
    poll_timeout: Duration,
    /// Packets that arrived behind the namespace ack, not yet handled.
    backlog: Vec<EnginePacket>,
}

impl Link {
    fn new(info: OpenInfo) -> Self {
        let window = Duration::from_millis(info.ping_interval + info.ping_timeout);
        Self {
            sid: info.sid,
            poll_timeout: window + POLL_SLACK,
            backlog: Vec::new(),
        }
    }
}

enum LinkEnd {
    /// Network or protocol failure; worth reconnecting.
    Lost(String),
    /// The server removed us from the namespace.
    ServerDisconnect,
    /// Nobody is listening to events anymore.
    Abandoned,
}

// ============================================================================
// Worker
// ============================================================================

/// Connect, pump, and reconnect until told to stop or out of attempts.
async fn run(shared: Arc<Shared>, sink: EventSink) {
    let mut failures = 0u32;
    loop {
        info!("Connecting to {} (namespace {})", shared.endpoint, shared.namespace);
        let attempt = tokio::time::timeout(shared.policy.connect_timeout, shared.handshake()).await;

        match attempt {
            Ok(Ok(link)) => {
                failures = 0;
                info!("Joined {} as {}", shared.namespace, link.sid);
                shared.set_sid(Some(link.sid.clone()));
                if !sink.send(TransportEvent::Connected) {
                    return;
                }

                let end = shared.pump(link, &sink).await;
                shared.set_sid(None);
                match end {
                    LinkEnd::Abandoned => return,
                    LinkEnd::ServerDisconnect => {
                        info!("Server closed the namespace");
                        sink.send(TransportEvent::Disconnected("io server disconnect".into()));
                        return;
                    }
                    LinkEnd::Lost(reason) => {
                        warn!("Link lost: {}", reason);
                        if !sink.send(TransportEvent::Disconnected(reason)) {
                            return;
                        }
                    }
                }
            }
            Ok(Err(e)) => {
                failures += 1;
                warn!("Connect attempt {} failed: {}", failures, e);
                if !sink.send(TransportEvent::ConnectError(e.to_string())) {
                    return;
                }
            }
            Err(_) => {
                failures += 1;
                warn!(
                    "Connect attempt {} timed out after {:?}",
                    failures, shared.policy.connect_timeout
                );
                if !sink.send(TransportEvent::ConnectError("timeout".into())) {
                    return;
                }
            }
        }

        if failures > shared.policy.attempts {
            warn!("Giving up after {} failed attempts", failures);
            return;
        }
        tokio::time::sleep(shared.policy.delay).await;
    }
}

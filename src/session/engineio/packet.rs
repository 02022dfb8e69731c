//! Engine.IO v4 and Socket.IO v5 text packet codec.
//!
//! ```text
//! HTTP body:      <packet>\x1e<packet>\x1e...
//! Engine packet:  0{open json} | 1 | 2 | 3 | 4<socket packet> | 6
//! Socket packet:  <type>[/namespace,][ack id][json]
//! ```
//!
//! Binary packets are not supported; the chat service only sends text.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Separator between packets in one polling payload.
pub const RECORD_SEPARATOR: char = '\x1e';

#[derive(Debug, Clone, PartialEq)]
pub enum PacketError {
    Empty,
    UnknownType(char),
    BadOpen(String),
    BadJson(String),
    Binary,
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::Empty => write!(f, "empty packet"),
            PacketError::UnknownType(c) => write!(f, "unknown packet type '{c}'"),
            PacketError::BadOpen(msg) => write!(f, "invalid open packet: {msg}"),
            PacketError::BadJson(msg) => write!(f, "invalid packet data: {msg}"),
            PacketError::Binary => write!(f, "binary packets are not supported"),
        }
    }
}

impl std::error::Error for PacketError {}

/// Handshake data sent by the server in the open packet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping,
    Pong,
    Message(String),
    Noop,
}

impl EnginePacket {
    pub fn decode(raw: &str) -> Result<Self, PacketError> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();
        match kind {
            '0' => serde_json::from_str(rest)
                .map(EnginePacket::Open)
                .map_err(|e| PacketError::BadOpen(e.to_string())),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping),
            '3' => Ok(EnginePacket::Pong),
            '4' => Ok(EnginePacket::Message(rest.to_string())),
            '6' => Ok(EnginePacket::Noop),
            'b' => Err(PacketError::Binary),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    /// Encode for the POST body. `Open` is server-only and encodes as a bare `0`.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping => "2".to_string(),
            EnginePacket::Pong => "3".to_string(),
            EnginePacket::Message(body) => format!("4{body}"),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// Split a polling payload into engine packets.
pub fn decode_payload(body: &str) -> Result<Vec<EnginePacket>, PacketError> {
    body.split(RECORD_SEPARATOR)
        .filter(|p| !p.is_empty())
        .map(EnginePacket::decode)
        .collect()
}

/// Socket.IO packets carried inside engine `Message` packets.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace join request (client) or acknowledgement (server).
    Connect { namespace: String, data: Option<Value> },
    Disconnect { namespace: String },
    /// `["event", arg, ...]`
    Event { namespace: String, event: String, args: Vec<Value> },
    Ack { namespace: String, id: u64, args: Vec<Value> },
    ConnectError { namespace: String, message: String },
}

impl SocketPacket {
    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn decode(raw: &str) -> Result<Self, PacketError> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();
        if matches!(kind, '5' | '6') {
            return Err(PacketError::Binary);
        }

        let (namespace, rest) = split_namespace(rest);
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (ack_id, data) = rest.split_at(digits);
        let data = if data.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(data).map_err(|e| PacketError::BadJson(e.to_string()))?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match data {
                    Some(Value::Array(args)) => args,
                    _ => return Err(PacketError::BadJson("event data must be an array".into())),
                };
                if args.is_empty() {
                    return Err(PacketError::BadJson("event without a name".into()));
                }
                let event = match args.remove(0) {
                    Value::String(name) => name,
                    other => return Err(PacketError::BadJson(format!("event name {other} is not a string"))),
                };
                Ok(SocketPacket::Event { namespace, event, args })
            }
            '3' => {
                let id = ack_id
                    .parse()
                    .map_err(|_| PacketError::BadJson("ack without id".into()))?;
                let args = match data {
                    Some(Value::Array(args)) => args,
                    _ => Vec::new(),
                };
                Ok(SocketPacket::Ack { namespace, id, args })
            }
            '4' => {
                let message = match &data {
                    Some(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("connection refused")
                        .to_string(),
                    Some(Value::String(s)) => s.clone(),
                    _ => "connection refused".to_string(),
                };
                Ok(SocketPacket::ConnectError { namespace, message })
            }
            other => Err(PacketError::UnknownType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect { namespace, data } => {
                let data = data.as_ref().map(Value::to_string).unwrap_or_default();
                format!("0{}{}", namespace_prefix(namespace), data)
            }
            SocketPacket::Disconnect { namespace } => format!("1{}", namespace_prefix(namespace)),
            SocketPacket::Event { namespace, event, args } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(event.clone()));
                array.extend(args.iter().cloned());
                format!("2{}{}", namespace_prefix(namespace), Value::Array(array))
            }
            SocketPacket::Ack { namespace, id, args } => {
                format!("3{}{}{}", namespace_prefix(namespace), id, Value::Array(args.clone()))
            }
            SocketPacket::ConnectError { namespace, message } => {
                let data = serde_json::json!({ "message": message });
                format!("4{}{}", namespace_prefix(namespace), data)
            }
        }
    }
}

/// `/chat,rest` → ("/chat", "rest"); anything else is the root namespace.
fn split_namespace(rest: &str) -> (String, &str) {
    if !rest.starts_with('/') {
        return ("/".to_string(), rest);
    }
    match rest.find(',') {
        Some(comma) => (rest[..comma].to_string(), &rest[comma + 1..]),
        None => (rest.to_string(), ""),
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == "/" {
        String::new()
    } else {
        format!("{namespace},")
    }
}

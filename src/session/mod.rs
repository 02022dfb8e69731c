//! # Chat Session
//!
//! ```text
//! SessionManager ──ask──► Transport::emit("message", {userID, context, requestId})
//!        ▲                         │
//!        └── EventSink ◄── connect/disconnect/connect_error/message
//! ```
//!
//! - `transport` - the duplex channel seam ([`Transport`]) and its events
//! - `engineio` - the Socket.IO-over-polling implementation used in production
//! - `manager` - connection state and question/answer pairing
//! - `payload` - wire shapes and answer extraction

pub mod engineio;
pub mod manager;
pub mod payload;
pub mod transport;

pub use engineio::{EngineIoTransport, ReconnectPolicy};
pub use manager::{ConnectionState, SessionError, SessionManager, SessionSettings};
pub use transport::{EventSink, Transport, TransportError, TransportEvent};

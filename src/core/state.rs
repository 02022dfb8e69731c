//! # Chat State
//!
//! Business state for the chat screen. No TUI-specific types here;
//! presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── user: UserRecord              // who is asking
//! ├── messages: Vec<ChatMessage>    // conversation, oldest first
//! ├── connection: ConnectionState   // mirrors the session manager
//! ├── is_loading: bool              // a question is in flight
//! ├── status_message: String        // status bar text
//! └── max_input_chars: usize        // input limit
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use crate::core::identity::UserRecord;
use crate::core::message::ChatMessage;
use crate::session::ConnectionState;

pub const DEFAULT_MAX_INPUT_CHARS: usize = 500;

pub struct App {
    pub user: UserRecord,
    pub messages: Vec<ChatMessage>,
    pub connection: ConnectionState,
    pub is_loading: bool,
    pub status_message: String,
    pub max_input_chars: usize,
}

impl App {
    /// Fresh chat screen for `user`, opening with the welcome message.
    pub fn new(user: UserRecord, max_input_chars: usize) -> Self {
        let welcome = ChatMessage::welcome(user.display_name());
        Self {
            user,
            messages: vec![welcome],
            connection: ConnectionState::Connecting,
            is_loading: false,
            status_message: String::from("Connecting..."),
            max_input_chars,
        }
    }

    /// Index of the pending placeholder, if one is showing.
    pub fn pending_index(&self) -> Option<usize> {
        self.messages.iter().position(|m| m.pending)
    }
}

//! # Chat Messages
//!
//! A conversation is an ordered list of `ChatMessage`s. Messages are immutable
//! once created; the only exception is the assistant's pending placeholder,
//! which is swapped out in place for the real answer (or the error reply).

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Shown when an answer payload carries no usable text.
pub const FALLBACK_ANSWER: &str =
    "I apologize, but I had trouble understanding that. Could you please rephrase your question?";

/// Shown in place of the placeholder when a question fails (timeout, transport error).
pub const ERROR_REPLY: &str =
    "Sorry, I'm experiencing some technical difficulties. Please try again in a moment.";

/// Who wrote a message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Unique per message, never reused.
    pub id: String,
    pub text: String,
    pub origin: Origin,
    pub created_at: DateTime<Local>,
    /// True only for the assistant placeholder awaiting an answer.
    #[serde(default)]
    pub pending: bool,
}

impl ChatMessage {
    fn new(origin: Origin, text: String, pending: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text,
            origin,
            created_at: Local::now(),
            pending,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Origin::User, text.into(), false)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Origin::Assistant, text.into(), false)
    }

    /// Empty assistant message shown while a question is in flight.
    pub fn pending() -> Self {
        Self::new(Origin::Assistant, String::new(), true)
    }

    /// The greeting shown when the chat screen mounts.
    pub fn welcome(display_name: &str) -> Self {
        Self::assistant(format!(
            "Hello {display_name}! I'm your AI Farming Assistant 🌾\n\n\
             I can help you with:\n\
             - Crop care and cultivation\n\
             - Pest and disease control\n\
             - Soil management and testing\n\
             - Fertilizers and nutrients\n\
             - Weather and irrigation guidance\n\
             - Market insights and pricing\n\n\
             What farming question can I help you with today?"
        ))
    }

    /// Local time of day, e.g. `09:41`.
    pub fn time_label(&self) -> String {
        self.created_at.format("%H:%M").to_string()
    }
}

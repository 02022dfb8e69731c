//! # Actions
//!
//! Everything that can happen on the chat screen becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The assistant answers? That's `Action::AnswerReceived(text)`.
//!
//! `update()` applies an action to the state and returns the `Effect` the
//! adapter has to carry out. No I/O happens here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::core::message::{ChatMessage, ERROR_REPLY};
use crate::core::state::App;
use crate::session::ConnectionState;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// User pressed Enter with this input.
    Submit(String),
    AnswerReceived(String),
    /// The question failed. The reason is for the log only.
    AskFailed(String),
    ConnectionChanged(ConnectionState),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Ask the session manager this (trimmed) question.
    SendQuestion(String),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            let question = text.trim();
            if question.is_empty() {
                return Effect::None;
            }
            if app.is_loading {
                debug!("Ignoring submit while a question is pending");
                return Effect::None;
            }

            app.messages.retain(|m| !m.pending);
            app.messages.push(ChatMessage::user(question));
            app.messages.push(ChatMessage::pending());
            app.is_loading = true;
            info!("Submitting question ({} chars)", question.len());
            Effect::SendQuestion(question.to_string())
        }
        Action::AnswerReceived(text) => {
            resolve_pending(app, ChatMessage::assistant(text));
            Effect::None
        }
        Action::AskFailed(reason) => {
            warn!("Question failed: {}", reason);
            resolve_pending(app, ChatMessage::assistant(ERROR_REPLY));
            Effect::None
        }
        Action::ConnectionChanged(state) => {
            app.connection = state;
            app.status_message = match state {
                ConnectionState::Connecting => "Connecting...".to_string(),
                ConnectionState::Connected => "Connected".to_string(),
                ConnectionState::Disconnected => "Disconnected".to_string(),
                ConnectionState::Error => "Connection error".to_string(),
            };
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

/// Swap the placeholder for `reply`, in place. Without a placeholder the
/// reply is appended.
fn resolve_pending(app: &mut App, reply: ChatMessage) {
    app.is_loading = false;
    match app.pending_index() {
        Some(idx) => app.messages[idx] = reply,
        None => app.messages.push(reply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Origin;
    use crate::test_support::test_app;

    #[test]
    fn submit_adds_question_and_placeholder() {
        let mut app = test_app();
        let effect = update(&mut app, Action::Submit("  How do I treat aphids?  ".into()));

        assert_eq!(effect, Effect::SendQuestion("How do I treat aphids?".into()));
        assert!(app.is_loading);
        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.messages[1].origin, Origin::User);
        assert_eq!(app.messages[1].text, "How do I treat aphids?");
        assert!(app.messages[2].pending);
    }

    #[test]
    fn blank_submit_is_ignored() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Submit("   ".into())), Effect::None);
        assert_eq!(app.messages.len(), 1);
    }

    #[test]
    fn submit_while_loading_is_ignored() {
        let mut app = test_app();
        update(&mut app, Action::Submit("first".into()));
        assert_eq!(update(&mut app, Action::Submit("second".into())), Effect::None);
        assert_eq!(app.messages.len(), 3);
    }

    #[test]
    fn answer_replaces_placeholder_in_place() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        let placeholder_at = app.pending_index().unwrap();

        update(&mut app, Action::AnswerReceived("Use **neem oil**.".into()));
        assert!(!app.is_loading);
        assert_eq!(app.pending_index(), None);
        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.messages[placeholder_at].text, "Use **neem oil**.");
        assert_eq!(app.messages[placeholder_at].origin, Origin::Assistant);
    }

    #[test]
    fn failure_shows_error_reply() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        update(&mut app, Action::AskFailed("no answer after 30s".into()));

        assert!(!app.is_loading);
        assert_eq!(app.messages.last().unwrap().text, ERROR_REPLY);
        assert!(app.messages.iter().all(|m| !m.text.contains("30s")));
    }

    #[test]
    fn connection_changes_update_status() {
        let mut app = test_app();
        update(&mut app, Action::ConnectionChanged(ConnectionState::Connected));
        assert_eq!(app.connection, ConnectionState::Connected);
        assert_eq!(app.status_message, "Connected");

        update(&mut app, Action::ConnectionChanged(ConnectionState::Error));
        assert_eq!(app.status_message, "Connection error");
    }

    #[test]
    fn quit() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}

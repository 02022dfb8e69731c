//! # Login Component
//!
//! Centered sign-in card: an id field, the inline error from the last
//! attempt (validation issues or the server's message) and a status line.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `LoginState` lives in the run loop for as long as nobody is signed in
//! - `Login` is created each frame with the borrowed state and the current
//!   `IdentityState` as a prop

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Padding, Paragraph, Wrap};

use super::centered_rect;
use super::input_box::{self, InputBox, InputEvent};
use crate::core::identity::{IdentityState, MAX_USER_ID_LEN};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum LoginEvent {
    /// Raw id as typed. Validation happens in the run loop.
    Submit(String),
    /// The id was edited; any shown error should be cleared.
    Edited,
}

pub struct LoginState {
    pub input: InputBox,
}

impl Default for LoginState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginState {
    pub fn new() -> Self {
        Self {
            input: InputBox::new(" User ID ")
                .placeholder("e.g. TEST001")
                .max_chars(MAX_USER_ID_LEN),
        }
    }
}

impl EventHandler for LoginState {
    type Event = LoginEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match self.input.handle_event(event)? {
            InputEvent::Submit(id) => Some(LoginEvent::Submit(id)),
            InputEvent::ContentChanged => Some(LoginEvent::Edited),
        }
    }
}

pub struct Login<'a> {
    pub state: &'a mut LoginState,
    pub identity: &'a IdentityState,
}

impl<'a> Login<'a> {
    pub fn new(state: &'a mut LoginState, identity: &'a IdentityState) -> Self {
        Self { state, identity }
    }
}

impl<'a> Component for Login<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let card = centered_rect(60, 60, area);
        frame.render_widget(Clear, card);

        let block = Block::bordered()
            .border_style(Style::default().fg(Color::Green))
            .title(" Sign in ")
            .title_alignment(Alignment::Center)
            .title_bottom(Line::from(" Enter Sign in  Ctrl+C Quit ").centered())
            .padding(Padding::horizontal(1));
        let inner = block.inner(card);
        frame.render_widget(block, card);

        let [intro, field, feedback] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(input_box::HEIGHT),
            Constraint::Min(1),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new("Welcome to your farming assistant. Enter your user ID to continue.")
                .wrap(Wrap { trim: true }),
            intro,
        );

        let loading = self.identity.is_loading();
        self.state.input.disabled = loading;
        self.state.input.render(frame, field);

        let (text, style) = match self.identity {
            IdentityState::Failed(message) => (
                message.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            IdentityState::Loading => (
                "Signing in...".to_string(),
                Style::default().fg(Color::Yellow),
            ),
            _ => (String::new(), Style::default()),
        };
        frame.render_widget(
            Paragraph::new(text).style(style).wrap(Wrap { trim: true }),
            feedback,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(state: &mut LoginState, identity: &IdentityState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| Login::new(state, identity).render(f, f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn typing_reports_edits_and_enter_submits() {
        let mut state = LoginState::new();
        assert_eq!(
            state.handle_event(&TuiEvent::InputChar('t')),
            Some(LoginEvent::Edited)
        );
        state.handle_event(&TuiEvent::Paste("est001".into()));
        assert_eq!(
            state.handle_event(&TuiEvent::Submit),
            Some(LoginEvent::Submit("test001".into()))
        );
    }

    #[test]
    fn shows_inline_error() {
        let mut state = LoginState::new();
        let identity = IdentityState::Failed("Invalid user ID".into());
        let text = rendered(&mut state, &identity);
        assert!(text.contains("Sign in"));
        assert!(text.contains("Invalid user ID"));
    }

    #[test]
    fn loading_disables_input() {
        let mut state = LoginState::new();
        let text = rendered(&mut state, &IdentityState::Loading);
        assert!(text.contains("Signing in..."));
        assert!(state.input.disabled);
        assert_eq!(state.handle_event(&TuiEvent::InputChar('x')), None);
    }
}

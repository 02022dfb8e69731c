//! # TitleBar Component
//!
//! One-line header: app name, current screen, connection indicator, the
//! signed-in user, and the transient status message.
//!
//! ```text
//! Sprout | Chat | ● connected | Asha | Thinking...
//! ```
//!
//! Purely presentational. Every field is a prop supplied by the run loop;
//! the connection segment is omitted on screens with no chat channel.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::session::ConnectionState;
use crate::tui::component::Component;

const SEPARATOR: &str = " | ";

pub struct TitleBar {
    pub screen: String,
    /// `None` on screens that have no chat channel.
    pub connection: Option<ConnectionState>,
    pub user_label: Option<String>,
    pub status_message: String,
}

impl TitleBar {
    pub fn new(screen: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            connection: None,
            user_label: None,
            status_message: String::new(),
        }
    }

    pub fn connection(mut self, state: ConnectionState) -> Self {
        self.connection = Some(state);
        self
    }

    pub fn user(mut self, label: impl Into<String>) -> Self {
        self.user_label = Some(label.into());
        self
    }

    pub fn status(mut self, message: impl Into<String>) -> Self {
        self.status_message = message.into();
        self
    }

    fn line(&self) -> Line<'static> {
        let dim = Style::default().fg(Color::DarkGray);
        let mut spans = vec![
            Span::styled(
                "Sprout",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(SEPARATOR, dim),
            Span::raw(self.screen.clone()),
        ];

        if let Some(state) = self.connection {
            spans.push(Span::styled(SEPARATOR, dim));
            spans.push(Span::styled(
                format!("● {}", state.label()),
                Style::default().fg(connection_color(state)),
            ));
        }
        if let Some(user) = &self.user_label {
            spans.push(Span::styled(SEPARATOR, dim));
            spans.push(Span::raw(user.clone()));
        }
        if !self.status_message.is_empty() {
            spans.push(Span::styled(SEPARATOR, dim));
            spans.push(Span::styled(
                self.status_message.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            ));
        }
        Line::from(spans)
    }
}

fn connection_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Connected => Color::Green,
        ConnectionState::Disconnected => Color::DarkGray,
        ConnectionState::Error => Color::Red,
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}

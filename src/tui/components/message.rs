use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::message::{ChatMessage, Origin};
use crate::render::render_message;
use crate::tui::component::Component;
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Borders (1 left + 1 right) plus padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Top and bottom borders.
const VERTICAL_OVERHEAD: u16 = 2;

const PENDING_TEXT: &str = "Thinking...";

/// A single chat bubble. Created fresh each frame by `MessageList`.
///
/// User messages are green, assistant messages blue. The border title carries
/// the author and the local time; the body is the rendered segment text.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a ChatMessage,
}

impl<'a> Message<'a> {
    pub fn new(message: &'a ChatMessage) -> Self {
        Self { message }
    }

    /// Rows needed to draw `message` at `width`, borders included.
    ///
    /// Measured with the same `Paragraph` the widget renders, so the two
    /// never disagree.
    pub fn calculate_height(message: &ChatMessage, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = paragraph(message).line_count(content_width) as u16;
        lines.max(1) + VERTICAL_OVERHEAD
    }
}

fn origin_color(origin: Origin) -> Color {
    match origin {
        Origin::User => Color::Green,
        Origin::Assistant => Color::Blue,
    }
}

fn body(message: &ChatMessage) -> Text<'static> {
    if message.pending {
        return Text::from(Line::from(Span::styled(
            PENDING_TEXT,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    let rendered = render_message(message);
    markdown::to_text(&rendered.segments, origin_color(rendered.origin))
}

fn paragraph(message: &ChatMessage) -> Paragraph<'static> {
    Paragraph::new(body(message)).wrap(Wrap { trim: false })
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let role = match self.message.origin {
            Origin::User => "you",
            Origin::Assistant => "assistant",
        };
        let style = Style::default().fg(origin_color(self.message.origin));
        let border_style = if self.message.pending {
            style
        } else {
            style.add_modifier(Modifier::DIM)
        };

        let block = Block::bordered()
            .title(format!("{role} · {}", self.message.time_label()))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);
        paragraph(self.message).render(inner_area, buf);
    }
}

impl<'a> Component for Message<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(message: &ChatMessage, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| { let area = f.area(); Component::render(&mut Message::new(message), f, area) })
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
    fn single_line_height() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(Message::calculate_height(&msg, 80), 1 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn wrapped_height() {
        let msg = ChatMessage::user("Hello world");
        // content width 5: "Hello" | "world"
        assert_eq!(Message::calculate_height(&msg, 9), 2 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn zero_width_returns_minimum() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(Message::calculate_height(&msg, HORIZONTAL_OVERHEAD), 1);
    }

    #[test]
    fn multi_segment_height_counts_each_line() {
        let msg = ChatMessage::assistant("## Aphids\n- neem oil\n- soap spray");
        assert_eq!(Message::calculate_height(&msg, 80), 3 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn pending_shows_thinking() {
        let msg = ChatMessage::pending();
        assert_eq!(Message::calculate_height(&msg, 80), 1 + VERTICAL_OVERHEAD);
        let text = draw(&msg, 40, 3);
        assert!(text.contains("Thinking..."));
        assert!(text.contains("assistant"));
    }

    #[test]
    fn renders_markup_without_markers() {
        let msg = ChatMessage::assistant("Use **neem oil** weekly.");
        let text = draw(&msg, 40, 3);
        assert!(text.contains("Use neem oil weekly."));
        assert!(!text.contains("**"));
    }

    #[test]
    fn colours_follow_origin() {
        assert_eq!(origin_color(Origin::User), Color::Green);
        assert_eq!(origin_color(Origin::Assistant), Color::Blue);
    }
}

//! # InputBox Component
//!
//! Single-line text field shared by the sign-in form, the catalog search and
//! the chat composer.
//!
//! ## State vs props
//!
//! The buffer, cursor and horizontal scroll are internal state. `title`,
//! `placeholder`, `max_chars` and `disabled` are props the parent sets each
//! frame. A disabled box still renders its text but ignores edits and never
//! submits.
//!
//! ```text
//! ╭ Ask a farming question ────────────╮
//! │ How do I treat aphids?█            │
//! ╰───────────────────────────── 22/500╯
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2).
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Offset from area edge to first content column.
const CONTENT_OFFSET: u16 = 2;
pub const HEIGHT: u16 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed with non-blank text. The buffer has been cleared.
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    buffer: String,
    /// Byte offset into `buffer`.
    cursor: usize,
    /// First visible display column.
    scroll: usize,
    pub title: String,
    pub placeholder: String,
    /// Character limit, `None` for unlimited.
    pub max_chars: Option<usize>,
    pub disabled: bool,
    /// Whether the terminal cursor is drawn here.
    pub focused: bool,
}

impl InputBox {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            scroll: 0,
            title: title.into(),
            placeholder: String::new(),
            max_chars: None,
            disabled: false,
            focused: true,
        }
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    pub fn max_chars(mut self, limit: usize) -> Self {
        self.max_chars = Some(limit);
        self
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Insert at the cursor, truncated to whatever room `max_chars` leaves.
    /// Newlines become spaces.
    fn insert(&mut self, text: &str) -> bool {
        let room = self
            .max_chars
            .map_or(usize::MAX, |max| max.saturating_sub(self.char_count()));
        let accepted: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .filter(|c| !c.is_control())
            .take(room)
            .collect();
        if accepted.is_empty() {
            return false;
        }
        self.buffer.insert_str(self.cursor, &accepted);
        self.cursor += accepted.len();
        true
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.buffer.len())
    }

    /// Display column of the cursor.
    fn cursor_column(&self) -> usize {
        self.buffer[..self.cursor]
            .chars()
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }

    /// Scroll just enough to keep the cursor inside `width` columns.
    fn update_scroll(&mut self, width: usize) {
        let col = self.cursor_column();
        if col < self.scroll {
            self.scroll = col;
        } else if width > 0 && col >= self.scroll + width {
            self.scroll = col + 1 - width;
        }
    }

    /// The slice of the buffer shown in a window `width` columns wide.
    fn visible_text(&self, width: usize) -> String {
        let mut col = 0;
        let mut out = String::new();
        for c in self.buffer.chars() {
            let w = c.width().unwrap_or(0);
            if col >= self.scroll && col + w <= self.scroll + width {
                out.push(c);
            }
            col += w;
        }
        out
    }

    fn counter(&self) -> Option<String> {
        self.max_chars
            .map(|max| format!("{}/{}", self.char_count(), max))
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(HORIZONTAL_OVERHEAD) as usize;
        self.update_scroll(width);

        let border_style = if self.disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green)
        };
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(self.title.clone())
            .padding(ratatui::widgets::Padding::horizontal(1));
        if let Some(counter) = self.counter() {
            block = block.title_bottom(Line::from(counter).right_aligned());
        }

        let content = if self.buffer.is_empty() {
            Line::from(Span::styled(
                self.placeholder.clone(),
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(self.visible_text(width))
        };
        frame.render_widget(Paragraph::new(content).block(block), area);

        if self.focused && !self.disabled {
            let col = (self.cursor_column() - self.scroll) as u16;
            frame.set_cursor_position((area.x + CONTENT_OFFSET + col, area.y + 1));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.disabled {
            return None;
        }
        match event {
            TuiEvent::InputChar(c) => self
                .insert(c.encode_utf8(&mut [0; 4]))
                .then_some(InputEvent::ContentChanged),
            TuiEvent::Paste(text) => self.insert(text).then_some(InputEvent::ContentChanged),
            TuiEvent::Backspace => (self.cursor > 0).then(|| {
                let prev = self.prev_boundary();
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.cursor < self.buffer.len()).then(|| {
                let next = self.next_boundary();
                self.buffer.drain(self.cursor..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => {
                self.cursor = self.prev_boundary();
                None
            }
            TuiEvent::CursorRight => {
                self.cursor = self.next_boundary();
                None
            }
            TuiEvent::CursorHome => {
                self.cursor = 0;
                None
            }
            TuiEvent::CursorEnd => {
                self.cursor = self.buffer.len();
                None
            }
            TuiEvent::Submit => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.clear();
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

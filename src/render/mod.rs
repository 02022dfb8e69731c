//! # Structured Text Renderer
//!
//! Turns assistant answers (and user messages, symmetrically) into an ordered
//! list of typed segments. Pure: no I/O, no state, never fails.
//!
//! ```text
//! text ──► split_fences ──► classify lines ──► scan_line ──► Vec<TextSegment>
//!          (block.rs)       (block.rs)         (inline.rs)
//! ```
//!
//! Malformed markup degrades to literal text. An unterminated fence is kept as
//! plain text together with everything after it.

mod block;
mod inline;

pub use block::{LineKind, Region, classify, split_fences};
pub use inline::scan_line;

use crate::core::message::{ChatMessage, Origin};

/// A styled fragment inside a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    Plain(String),
    Bold(String),
    Italic(String),
    Code(String),
}

impl InlineSpan {
    pub fn text(&self) -> &str {
        match self {
            InlineSpan::Plain(s) | InlineSpan::Bold(s) | InlineSpan::Italic(s) | InlineSpan::Code(s) => s,
        }
    }
}

/// One block of rendered output.
///
/// Inline spans never appear at the top level: text outside any list item,
/// header or fence is always wrapped in a `Paragraph`, one per source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment {
    Paragraph(Vec<InlineSpan>),
    ListItem(Vec<InlineSpan>),
    Header { level: u8, spans: Vec<InlineSpan> },
    /// Fenced block. `multiline` is true when the fenced body spans lines.
    CodeBlock { content: String, multiline: bool },
}

/// Segments of a chat message, tagged with the origin so the presentation
/// layer can choose colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub origin: Origin,
    pub segments: Vec<TextSegment>,
}

/// Render text into segments. `None` and `""` both render to nothing.
pub fn render<'a>(text: impl Into<Option<&'a str>>) -> Vec<TextSegment> {
    let Some(text) = text.into() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    for region in split_fences(text) {
        match region {
            Region::Code(body) => segments.push(TextSegment::CodeBlock {
                content: body.trim().to_string(),
                multiline: body.contains('\n'),
            }),
            Region::Text(body) => {
                segments.extend(body.split('\n').filter_map(line_segment));
            }
        }
    }
    segments
}

/// Render a chat message. Pending placeholders render to no segments.
pub fn render_message(message: &ChatMessage) -> RenderedMessage {
    let segments = if message.pending {
        Vec::new()
    } else {
        render(message.text.as_str())
    };
    RenderedMessage {
        origin: message.origin,
        segments,
    }
}

fn line_segment(line: &str) -> Option<TextSegment> {
    match classify(line) {
        LineKind::ListItem(content) => Some(TextSegment::ListItem(scan_line(content))),
        LineKind::Header { level, content } => Some(TextSegment::Header {
            level,
            spans: scan_line(content),
        }),
        LineKind::Plain(content) => Some(TextSegment::Paragraph(scan_line(content))),
        LineKind::Blank => None,
    }
}

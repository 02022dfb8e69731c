//! Rendered segments → ratatui `Text`.
//!
//! Maps the renderer's `TextSegment`s onto styled `Line`/`Span` values:
//! headers get `#` prefixes and the heading style, list items a dim `- `
//! marker, code blocks a rounded left border. Inline spans compose with the
//! message's base colour.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::render::{InlineSpan, TextSegment};

/// Build owned `Text` for `segments`, using `base_fg` for plain text.
pub fn to_text(segments: &[TextSegment], base_fg: Color) -> Text<'static> {
    let base = Style::default().fg(base_fg);
    let mut text = Text::default();

    for segment in segments {
        match segment {
            TextSegment::Paragraph(spans) => {
                text.lines.push(Line::from(inline_spans(spans, base)));
            }
            TextSegment::ListItem(spans) => {
                let mut line = vec![Span::styled("- ", Style::default().fg(Color::DarkGray))];
                line.extend(inline_spans(spans, base));
                text.lines.push(Line::from(line));
            }
            TextSegment::Header { level, spans } => {
                let hs = heading_style(base_fg, *level);
                let mut line = vec![Span::styled(format!("{} ", "#".repeat(*level as usize)), hs)];
                line.extend(inline_spans(spans, hs));
                text.lines.push(Line::from(line));
            }
            TextSegment::CodeBlock { content, multiline } => {
                push_code_block(&mut text, content, *multiline);
            }
        }
    }
    text
}

fn inline_spans(spans: &[InlineSpan], base: Style) -> Vec<Span<'static>> {
    spans
        .iter()
        .map(|span| {
            let style = match span {
                InlineSpan::Plain(_) => base,
                InlineSpan::Bold(_) => base.add_modifier(Modifier::BOLD),
                InlineSpan::Italic(_) => base.add_modifier(Modifier::ITALIC),
                InlineSpan::Code(_) => code_style(),
            };
            // ratatui renders \t as zero-width
            Span::styled(span.text().replace('\t', "    "), style)
        })
        .collect()
}

fn push_code_block(text: &mut Text<'static>, content: &str, multiline: bool) {
    let bs = Style::default().fg(Color::DarkGray);
    if !multiline {
        text.lines.push(Line::from(vec![
            Span::styled("│ ", bs),
            Span::styled(content.replace('\t', "    "), code_style()),
        ]));
        return;
    }

    text.lines.push(Line::from(Span::styled("╭──", bs)));
    for line in content.lines() {
        text.lines.push(Line::from(vec![
            Span::styled("│ ", bs),
            Span::styled(line.replace('\t', "    "), code_style()),
        ]));
    }
    text.lines.push(Line::from(Span::styled("╰──", bs)));
}

fn code_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn heading_style(base_fg: Color, level: u8) -> Style {
    let style = Style::default().fg(base_fg).add_modifier(Modifier::BOLD);
    match level {
        1 => style.add_modifier(Modifier::UNDERLINED),
        2 => style,
        _ => style.add_modifier(Modifier::ITALIC),
    }
}

//! # Inline Span Scanner
//!
//! Turns the content of one line into a sequence of [`InlineSpan`]s.
//!
//! ```text
//! line ──► code spans (`…`) ──► text between them ──► bold (**…**) / italic (*…*)
//! ```
//!
//! Matching rules:
//!
//! - Leftmost first. A delimiter only opens a span if a closing delimiter
//!   follows with at least one character in between.
//! - Non-overlapping. Scanning resumes right after the closing delimiter.
//! - At the same position bold is tried before italic.
//! - Bold and italic bodies never contain `*`; code bodies never contain a backtick.
//! - Callers hand in a single line, so a closing delimiter is never looked for
//!   past a newline. Unmatched delimiters stay in the output as literal text.

use super::InlineSpan;

const BACKTICK: char = '`';
const STAR: u8 = b'*';

/// Scan one line of text into inline spans.
///
/// Adjacent plain fragments are merged, so `"a `x` b"` yields exactly three spans.
pub fn scan_line(line: &str) -> Vec<InlineSpan> {
    let mut spans = SpanBuffer::default();
    let mut rest = line;

    while let Some((open, close)) = find_code_span(rest) {
        scan_emphasis(&rest[..open], &mut spans);
        spans.push(InlineSpan::Code(rest[open + 1..close].to_string()));
        rest = &rest[close + 1..];
    }
    scan_emphasis(rest, &mut spans);

    spans.into_inner()
}

/// Locate the leftmost `` `body` `` with a non-empty body.
/// Returns byte offsets of the opening and closing backtick.
fn find_code_span(text: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(offset) = text[from..].find(BACKTICK) {
        let open = from + offset;
        let body_start = open + 1;
        match text[body_start..].find(BACKTICK) {
            // "``": empty body, the second backtick may still open a span
            Some(0) => from = body_start,
            Some(len) => return Some((open, body_start + len)),
            None => return None,
        }
    }
    None
}

/// Scan text that contains no code spans for bold and italic runs.
fn scan_emphasis(text: &str, spans: &mut SpanBuffer) {
    let bytes = text.as_bytes();
    let mut plain_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != STAR {
            i += 1;
            continue;
        }

        if let Some(end) = delimited(text, i, "**") {
            spans.plain(&text[plain_start..i]);
            spans.push(InlineSpan::Bold(text[i + 2..end].to_string()));
            i = end + 2;
            plain_start = i;
        } else if let Some(end) = delimited(text, i, "*") {
            spans.plain(&text[plain_start..i]);
            spans.push(InlineSpan::Italic(text[i + 1..end].to_string()));
            i = end + 1;
            plain_start = i;
        } else {
            i += 1;
        }
    }

    spans.plain(&text[plain_start..]);
}

/// If `delim` starts at `at` and is followed by a non-empty star-free body and
/// another `delim`, returns the byte offset where the closing delimiter starts.
fn delimited(text: &str, at: usize, delim: &str) -> Option<usize> {
    if !text[at..].starts_with(delim) {
        return None;
    }
    let body_start = at + delim.len();
    let body = &text[body_start..];
    let len = body.find('*')?;
    if len == 0 || !body[len..].starts_with(delim) {
        return None;
    }
    Some(body_start + len)
}

/// Collects spans, merging consecutive plain fragments and skipping empty ones.
#[derive(Default)]
struct SpanBuffer {
    spans: Vec<InlineSpan>,
}

impl SpanBuffer {
    fn plain(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(InlineSpan::Plain(last)) = self.spans.last_mut() {
            last.push_str(text);
            return;
        }
        self.spans.push(InlineSpan::Plain(text.to_string()));
    }

    fn push(&mut self, span: InlineSpan) {
        self.spans.push(span);
    }

    fn into_inner(self) -> Vec<InlineSpan> {
        self.spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InlineSpan::{Bold, Code, Italic, Plain};

    fn plain(s: &str) -> InlineSpan {
        Plain(s.to_string())
    }

    #[test]
    fn plain_line_is_single_span() {
        assert_eq!(scan_line("just words"), vec![plain("just words")]);
    }

    #[test]
    fn empty_line_has_no_spans() {
        assert!(scan_line("").is_empty());
    }

    #[test]
    fn bold_in_the_middle() {
        assert_eq!(
            scan_line("Use **neem oil** weekly."),
            vec![plain("Use "), Bold("neem oil".into()), plain(" weekly.")]
        );
    }

    #[test]
    fn italic_span() {
        assert_eq!(
            scan_line("water *gently*"),
            vec![plain("water "), Italic("gently".into())]
        );
    }

    #[test]
    fn earlier_italic_wins_over_later_bold() {
        assert_eq!(
            scan_line("*a* and **b**"),
            vec![Italic("a".into()), plain(" and "), Bold("b".into())]
        );
    }

    #[test]
    fn inline_code_protects_its_body() {
        assert_eq!(
            scan_line("run `**not bold**` now"),
            vec![plain("run "), Code("**not bold**".into()), plain(" now")]
        );
    }

    #[test]
    fn emphasis_around_code_spans() {
        assert_eq!(
            scan_line("**pH** is `6.5` *ideal*"),
            vec![
                Bold("pH".into()),
                plain(" is "),
                Code("6.5".into()),
                plain(" "),
                Italic("ideal".into()),
            ]
        );
    }

    #[test]
    fn unterminated_delimiters_stay_literal() {
        assert_eq!(scan_line("**open"), vec![plain("**open")]);
        assert_eq!(scan_line("a `tick"), vec![plain("a `tick")]);
        assert_eq!(scan_line("2 * 3"), vec![plain("2 * 3")]);
    }

    #[test]
    fn empty_delimiters_stay_literal() {
        assert_eq!(scan_line("``"), vec![plain("``")]);
        assert_eq!(scan_line("****"), vec![plain("****")]);
    }

    #[test]
    fn double_backtick_then_span() {
        assert_eq!(
            scan_line("``x`"),
            vec![plain("`"), Code("x".into())]
        );
    }

    #[test]
    fn bold_falls_back_to_italic_one_star_later() {
        // "**x*" has no closing "**", but "*x*" starting at the second star is italic.
        assert_eq!(scan_line("**x*"), vec![plain("*"), Italic("x".into())]);
    }

    #[test]
    fn multibyte_text_is_preserved() {
        assert_eq!(
            scan_line("🌾 **गेहूं** ready"),
            vec![plain("🌾 "), Bold("गेहूं".into()), plain(" ready")]
        );
    }
}

//! # Block Stage
//!
//! Splits raw text on triple-backtick fences and classifies the lines of the
//! plain regions.
//!
//! ```text
//! "intro\n```\ncode\n```\n- item"
//!   ├── Region::Text("intro\n")
//!   ├── Region::Code("\ncode\n")
//!   └── Region::Text("\n- item")
//! ```

const FENCE: &str = "```";

/// A piece of the input between (or inside) fences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region<'a> {
    Text(&'a str),
    Code(&'a str),
}

/// Split `text` into alternating plain and fenced regions.
///
/// Each fence pairs with the next fence after it. A trailing fence without a
/// partner does not open a code region: it and everything after it remain
/// plain text.
pub fn split_fences(text: &str) -> Vec<Region<'_>> {
    let mut regions = Vec::new();
    let mut rest = text;

    loop {
        let Some(open) = rest.find(FENCE) else {
            break;
        };
        let body_start = open + FENCE.len();
        let Some(len) = rest[body_start..].find(FENCE) else {
            break;
        };

        if open > 0 {
            regions.push(Region::Text(&rest[..open]));
        }
        regions.push(Region::Code(&rest[body_start..body_start + len]));
        rest = &rest[body_start + len + FENCE.len()..];
    }

    if !rest.is_empty() {
        regions.push(Region::Text(rest));
    }
    regions
}

/// What a single line of a plain region is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `- item`, `* item`, `+ item`, optionally indented.
    ListItem(&'a str),
    /// `#` to `######` followed by whitespace.
    Header { level: u8, content: &'a str },
    Plain(&'a str),
    Blank,
}

/// Classify one line. List markers are checked before headers.
pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(content) = list_item(line) {
        return LineKind::ListItem(content);
    }
    if let Some((level, content)) = header(line) {
        return LineKind::Header { level, content };
    }
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    LineKind::Plain(line)
}

fn list_item(line: &str) -> Option<&str> {
    let rest = line.trim_start();
    let mut chars = rest.chars();
    if !matches!(chars.next()?, '-' | '*' | '+') {
        return None;
    }
    let after_marker = chars.as_str();
    let content = after_marker.trim_start();
    // at least one whitespace character must separate marker and content
    if content.len() == after_marker.len() {
        return None;
    }
    Some(content)
}

fn header(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let after_hashes = &line[hashes..];
    let content = after_hashes.trim_start();
    if content.len() == after_hashes.len() {
        return None;
    }
    Some((hashes as u8, content))
}

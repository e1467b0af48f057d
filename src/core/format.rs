//! # Result Text Formatting
//!
//! Splits result text into lines and classifies each one:
//!
//! - **Header**: ends with `:` (e.g. `Key Points:`)
//! - **Bullet**: starts with `-` or `•`
//! - **Paragraph**: anything else with content
//! - **Blank**: whitespace only
//!
//! Inside every line, paired `**...**` markers become emphasis spans. An
//! unpaired marker is kept as literal text, which is what a half-revealed
//! `**bold` looks like mid-animation.
//!
//! [`IncrementalFormatter`] keeps the lines that are already terminated by a
//! newline and only re-parses the trailing line, so a reveal tick costs
//! O(line length) instead of O(text length).

const EMPHASIS_MARKER: &str = "**";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Bullet,
    Paragraph,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub emphasis: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub kind: LineKind,
    pub spans: Vec<InlineSpan>,
}

impl FormattedLine {
    /// The line's text with markers removed.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Formats a single line (no newline inside).
pub fn format_line(line: &str) -> FormattedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return FormattedLine {
            kind: LineKind::Blank,
            spans: Vec::new(),
        };
    }

    let bullet_body = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('•'))
        .map(str::trim_start);

    let (kind, body) = match bullet_body {
        Some(body) => (LineKind::Bullet, body),
        None if trimmed.ends_with(':') || trimmed.ends_with(":**") => (LineKind::Header, trimmed),
        None => (LineKind::Paragraph, trimmed),
    };

    FormattedLine {
        kind,
        spans: parse_emphasis(body),
    }
}

/// Formats a whole text. Always yields one entry per `\n`-separated line,
/// including a trailing blank line after a final newline.
pub fn format_text(text: &str) -> Vec<FormattedLine> {
    text.split('\n').map(format_line).collect()
}

fn push_span(spans: &mut Vec<InlineSpan>, text: &str, emphasis: bool) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.emphasis == emphasis => last.text.push_str(text),
        _ => spans.push(InlineSpan {
            text: text.to_string(),
            emphasis,
        }),
    }
}

fn parse_emphasis(body: &str) -> Vec<InlineSpan> {
    let parts: Vec<&str> = body.split(EMPHASIS_MARKER).collect();
    let markers = parts.len() - 1;
    let paired = markers - markers % 2;

    let mut spans = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i > paired {
            // Everything after the last unpaired marker is literal.
            push_span(&mut spans, EMPHASIS_MARKER, false);
            push_span(&mut spans, part, false);
        } else {
            push_span(&mut spans, part, i % 2 == 1);
        }
    }
    spans
}

/// Caches formatted lines across calls with a growing prefix of one text.
#[derive(Debug, Default)]
pub struct IncrementalFormatter {
    lines: Vec<FormattedLine>,
    /// Lines in `lines` that ended with a newline and won't change.
    settled_lines: usize,
    /// Byte offset just past the last settled newline.
    settled_bytes: usize,
}

impl IncrementalFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.lines.clear();
        self.settled_lines = 0;
        self.settled_bytes = 0;
    }

    /// Formats `text`, which is expected to extend the text of the previous
    /// call. If it doesn't, the cache starts over.
    pub fn update(&mut self, text: &str) -> &[FormattedLine] {
        let extends_previous = self.settled_bytes == 0
            || (text.len() >= self.settled_bytes
                && text.as_bytes()[self.settled_bytes - 1] == b'\n');
        if !extends_previous {
            self.reset();
        }

        self.lines.truncate(self.settled_lines);

        let mut offset = self.settled_bytes;
        for piece in text[offset..].split_inclusive('\n') {
            if let Some(line) = piece.strip_suffix('\n') {
                self.lines.push(format_line(line));
                self.settled_lines += 1;
                offset += piece.len();
            }
        }
        self.settled_bytes = offset;
        self.lines.push(format_line(&text[offset..]));

        &self.lines
    }
}

//! # InputBox Component
//!
//! Text entry plus the staged-attachment chip.
//!
//! The buffer and cursor are internal state. The attachment label and the
//! `disabled` flag are props synced from `App` every frame. While disabled
//! (a request is in flight for the session) Enter is swallowed so the typed
//! text isn't lost.
//!
//! Lines are hard-wrapped at the inner width, one char per cell, so the
//! rendered text and the cursor position are computed the same way.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Borders (2) + padding (2)
const HORIZONTAL_OVERHEAD: u16 = 4;
const VERTICAL_OVERHEAD: u16 = 2;
/// Content lines shown before the box scrolls internally
const MAX_VISIBLE_LINES: u16 = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    pub buffer: String,
    /// Label of the staged attachment, e.g. "report.pdf (12.0 KB)" (Prop)
    pub attachment: Option<String>,
    /// A request is in flight for the current session (Prop)
    pub disabled: bool,
    /// Byte offset into `buffer`, always on a char boundary
    cursor: usize,
    scroll_offset: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            attachment: None,
            disabled: false,
            cursor: 0,
            scroll_offset: 0,
        }
    }

    /// Replace the buffer and put the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.scroll_offset = 0;
    }

    /// Height needed for the current buffer, clamped to the visible maximum.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let lines = visual_lines(&self.buffer, inner_width(area_width)).len() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn update_scroll_offset(&mut self, width: u16) {
        let (row, _) = cursor_row_col(&self.buffer, self.cursor, width);
        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if row >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = row + 1 - MAX_VISIBLE_LINES;
        }
    }

    fn render_scrollbar(&self, frame: &mut Frame, area: Rect, total_lines: u16) {
        if total_lines <= MAX_VISIBLE_LINES {
            return;
        }
        let mut state = ScrollbarState::default()
            .content_length(total_lines.saturating_sub(MAX_VISIBLE_LINES) as usize)
            .position(self.scroll_offset as usize);
        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut state,
        );
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        self.update_scroll_offset(width);

        let lines = visual_lines(&self.buffer, width);
        let visible: Vec<Line> = lines
            .iter()
            .skip(self.scroll_offset as usize)
            .take(MAX_VISIBLE_LINES as usize)
            .map(|l| Line::raw(l.clone()))
            .collect();

        let (title, border_style) = if self.disabled {
            (" Message (waiting for response) ", Style::default().fg(Color::DarkGray))
        } else {
            (" Message ", Style::default().fg(Color::Green))
        };

        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(title)
            .padding(ratatui::widgets::Padding::horizontal(1));
        if let Some(label) = &self.attachment {
            block = block.title_bottom(
                Line::styled(
                    format!(" [{label}] /detach "),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )
                .right_aligned(),
            );
        }

        frame.render_widget(Paragraph::new(visible).block(block), area);
        self.render_scrollbar(frame, area, lines.len() as u16);

        let (row, col) = cursor_row_col(&self.buffer, self.cursor, width);
        let x = area.x + 2 + col;
        let y = area.y + 1 + row.saturating_sub(self.scroll_offset);
        frame.set_cursor_position((x, y));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                let text = text.replace("\r\n", "\n");
                self.buffer.insert_str(self.cursor, &text);
                self.cursor += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => (self.cursor > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.cursor < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => (self.cursor > 0).then(|| {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorRight => (self.cursor < self.buffer.len()).then(|| {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorHome => {
                let line_start = self.buffer[..self.cursor]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                (self.cursor != line_start).then(|| {
                    self.cursor = line_start;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorEnd => {
                let line_end = self.buffer[self.cursor..]
                    .find('\n')
                    .map(|i| self.cursor + i)
                    .unwrap_or(self.buffer.len());
                (self.cursor != line_end).then(|| {
                    self.cursor = line_end;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::Submit => {
                if self.disabled {
                    return None;
                }
                // Empty submissions still go out so the reducer can explain why
                let text = std::mem::take(&mut self.buffer);
                self.clear();
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Rows a logical line of `chars` characters occupies. A line that exactly
/// fills the width gets an extra row so the cursor has somewhere to sit.
fn rows_for(chars: usize, width: usize) -> usize {
    chars / width + 1
}

/// Hard-wraps `text` into rows of at most `width` chars.
fn visual_lines(text: &str, width: u16) -> Vec<String> {
    let width = width.max(1) as usize;
    let mut out = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        for row in 0..rows_for(chars.len(), width) {
            let start = (row * width).min(chars.len());
            let end = ((row + 1) * width).min(chars.len());
            out.push(chars[start..end].iter().collect());
        }
    }
    out
}

/// Visual (row, col) of the byte offset `cursor`.
fn cursor_row_col(text: &str, cursor: usize, width: u16) -> (u16, u16) {
    let width = width.max(1) as usize;
    let before = &text[..cursor];
    let mut row = 0;
    let mut logical = before.split('\n').peekable();
    while let Some(line) = logical.next() {
        let chars = line.chars().count();
        if logical.peek().is_none() {
            return ((row + chars / width) as u16, (chars % width) as u16);
        }
        row += rows_for(chars, width);
    }
    (row as u16, 0)
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

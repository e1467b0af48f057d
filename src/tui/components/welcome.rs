//! # Welcome Screen
//!
//! Shown in place of the message list when there is no current chat or the
//! current chat is empty. Lists example prompts; Tab copies the highlighted
//! one into the input box.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::tui::component::Component;

pub const EXAMPLE_PROMPTS: [&str; 2] = [
    "I'm so excited about this new project!",
    "This is really frustrating and disappointing.",
];

pub struct WelcomeScreen<'a> {
    pub app_name: &'a str,
    pub welcome_text: &'a str,
    pub user: Option<&'a str>,
    /// False when no chat is selected: the hint is to start one
    pub has_session: bool,
    /// Example last copied into the input, if any
    pub highlighted: Option<usize>,
}

impl WelcomeScreen<'_> {
    fn lines(&self) -> Vec<Line<'static>> {
        let greeting = match self.user {
            Some(name) => format!("Welcome to {}, {}", self.app_name, name),
            None => format!("Welcome to {}", self.app_name),
        };
        let mut lines = vec![
            Line::from(Span::styled(
                greeting,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                self.welcome_text.to_string(),
                Style::default().fg(Color::Gray),
            )),
            Line::raw(""),
        ];

        if !self.has_session {
            lines.push(Line::from(Span::styled(
                "Press Ctrl+N to start a new chat, or Ctrl+O to open one.",
                Style::default().fg(Color::DarkGray),
            )));
            return lines;
        }

        lines.push(Line::from(Span::styled(
            "Try an example (Tab):",
            Style::default().fg(Color::DarkGray),
        )));
        for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
            let style = if self.highlighted == Some(i) {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            lines.push(Line::from(Span::styled(format!("\"{prompt}\""), style)));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Attach a document with /attach <path>, then /analyze or /summarize.",
            Style::default().fg(Color::DarkGray),
        )));
        lines
    }
}

impl Component for WelcomeScreen<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = self.lines();
        let [center] = Layout::vertical([Constraint::Length(lines.len() as u16)])
            .flex(Flex::Center)
            .areas(area);
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, center);
    }
}

/// Index of the example after `current`, wrapping around.
pub fn next_example(current: Option<usize>) -> usize {
    current.map_or(0, |i| (i + 1) % EXAMPLE_PROMPTS.len())
}

use chrono::Local;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::attachment::format_size;
use crate::core::format::{FormattedLine, LineKind, format_text};
use crate::core::message::{DocumentAction, Message, Payload};
use crate::gateway::AnalysisResult;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Top + bottom borders.
const VERTICAL_OVERHEAD: u16 = 2;
/// Cells in a full distribution bar.
const BAR_WIDTH: usize = 20;

/// Renders one chat message.
///
/// Transient: built each frame by `MessageList`. `revealed` carries the
/// formatted prefix of a summary that is still being revealed; without it
/// the full text is shown.
#[derive(Clone, Copy)]
pub struct MessageView<'a> {
    pub message: &'a Message,
    pub revealed: Option<&'a [FormattedLine]>,
}

impl<'a> MessageView<'a> {
    pub fn new(message: &'a Message, revealed: Option<&'a [FormattedLine]>) -> Self {
        Self { message, revealed }
    }

    fn title(&self) -> String {
        let time = self.message.created_at().with_timezone(&Local).format("%H:%M");
        match self.message {
            Message::User(_) => format!(" You · {time} "),
            Message::Assistant(m) => {
                let what = match (&m.payload, m.action) {
                    (Payload::Error(_), _) => "Error",
                    (Payload::Summary(_), _) => "Summary",
                    (Payload::Analysis(_), Some(DocumentAction::AnalyzeSentiment)) => {
                        "Document sentiment"
                    }
                    (Payload::Analysis(_), _) => "Sentiment",
                };
                format!(" Verdict · {what} · {time} ")
            }
        }
    }

    fn style(&self) -> Style {
        match self.message {
            Message::User(_) => Style::default().fg(Color::Green),
            Message::Assistant(m) if matches!(m.payload, Payload::Error(_)) => {
                Style::default().fg(Color::Red)
            }
            Message::Assistant(_) => Style::default().fg(Color::Blue),
        }
    }

    /// Body lines, before wrapping.
    pub fn lines(&self) -> Vec<Line<'static>> {
        match self.message {
            Message::User(m) => {
                let mut lines: Vec<Line> = m
                    .content
                    .lines()
                    .map(|l| Line::raw(l.to_string()))
                    .collect();
                if let Some(attachment) = &m.attachment {
                    lines.push(Line::styled(
                        format!("[{}] {}", attachment.name, format_size(attachment.size_bytes)),
                        Style::default().fg(Color::Cyan),
                    ));
                }
                lines
            }
            Message::Assistant(m) => match &m.payload {
                Payload::Analysis(result) => analysis_lines(result),
                Payload::Summary(summary) => match self.revealed {
                    Some(revealed) => formatted_lines(revealed),
                    None => formatted_lines(&format_text(&summary.summary_text)),
                },
                Payload::Error(e) => vec![Line::raw(e.message.clone())],
            },
        }
    }

    /// Height for `width`, predicted with textwrap so `MessageList` can lay
    /// out the scroll view without rendering.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let rows: usize = self
            .lines()
            .iter()
            .map(|line| {
                let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
                textwrap::wrap(&text, &options).len().max(1)
            })
            .sum();
        (rows as u16).max(1) + VERTICAL_OVERHEAD
    }
}

impl Widget for MessageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = self.style();
        let block = Block::bordered()
            .title(self.title())
            .border_type(BorderType::Rounded)
            .border_style(style.add_modifier(Modifier::DIM))
            .title_style(style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "██████████░░░░░░░░░░" for 50%.
fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn analysis_lines(result: &AnalysisResult) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::raw("Predicted: "),
        Span::styled(
            capitalize(&result.predicted_label),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" · {:.1}% confidence", result.confidence_percent)),
    ])];

    if !result.distribution.is_empty() {
        lines.push(Line::raw(""));
        let label_width = result
            .distribution
            .iter()
            .map(|e| e.label.chars().count())
            .max()
            .unwrap_or(0);
        let predicted = result.predicted_entry().map(|e| e.label.as_str());
        for entry in &result.distribution {
            let highlight = predicted == Some(entry.label.as_str());
            let style = if highlight {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{:<label_width$} ", capitalize(&entry.label))),
                Span::styled(bar(entry.probability_percent), style),
                Span::raw(format!(" {:>5.1}%", entry.probability_percent)),
            ]));
        }
    }
    lines
}

fn formatted_lines(lines: &[FormattedLine]) -> Vec<Line<'static>> {
    lines
        .iter()
        .map(|line| {
            let base = match line.kind {
                LineKind::Header => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default(),
            };
            let mut spans = Vec::with_capacity(line.spans.len() + 1);
            if line.kind == LineKind::Bullet {
                spans.push(Span::styled("• ", Style::default().fg(Color::Cyan)));
            }
            spans.extend(line.spans.iter().map(|s| {
                let style = if s.emphasis {
                    base.add_modifier(Modifier::BOLD)
                } else {
                    base
                };
                Span::styled(s.text.clone(), style)
            }));
            Line::from(spans)
        })
        .collect()
}

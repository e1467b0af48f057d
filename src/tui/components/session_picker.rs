//! # Session Picker Component
//!
//! Overlay listing every chat, most recent first, with its relative date and
//! message count. Opened with Ctrl+O, dismissed with Esc.
//!
//! - `SessionPickerState` lives in `TuiState` while the overlay is open
//! - `SessionPicker` is created each frame with borrowed state
//!
//! Rows are a snapshot taken when the overlay opens; after a delete the row
//! is removed locally rather than re-read from the store.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::core::presenter::{SessionSummary, message_count_label};
use crate::core::session::SessionId;
use crate::tui::component::EventHandler;
use crate::tui::event::TuiEvent;

pub struct SessionPickerState {
    pub sessions: Vec<SessionSummary>,
    pub selected: usize,
    pub confirm_delete: bool,
    pub list_state: ListState,
}

/// Events emitted by the session picker.
#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    Select(SessionId),
    CreateNew,
    Delete(SessionId),
    Dismiss,
}

impl SessionPickerState {
    /// Opens with the current session highlighted.
    pub fn new(sessions: Vec<SessionSummary>) -> Self {
        let selected = sessions.iter().position(|s| s.is_current).unwrap_or(0);
        let mut list_state = ListState::default();
        if !sessions.is_empty() {
            list_state.select(Some(selected));
        }
        Self {
            sessions,
            selected,
            confirm_delete: false,
            list_state,
        }
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.list_state.select(Some(index));
    }

    /// Remove a row after deletion.
    pub fn remove_session(&mut self, id: &str) {
        self.sessions.retain(|s| s.id != id);
        if self.sessions.is_empty() {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.select(self.selected.min(self.sessions.len() - 1));
        }
    }
}

impl EventHandler for SessionPickerState {
    type Event = PickerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<PickerEvent> {
        // Any other key cancels a pending delete
        if !matches!(event, TuiEvent::InputChar('d')) {
            self.confirm_delete = false;
        }

        match event {
            TuiEvent::Escape => Some(PickerEvent::Dismiss),
            TuiEvent::CursorUp => {
                if !self.sessions.is_empty() {
                    self.select(self.selected.saturating_sub(1));
                }
                None
            }
            TuiEvent::CursorDown => {
                if !self.sessions.is_empty() {
                    self.select((self.selected + 1).min(self.sessions.len() - 1));
                }
                None
            }
            TuiEvent::Submit => self
                .sessions
                .get(self.selected)
                .map(|s| PickerEvent::Select(s.id.clone())),
            TuiEvent::InputChar('n') | TuiEvent::NewSession => Some(PickerEvent::CreateNew),
            TuiEvent::InputChar('d') => {
                let id = self.sessions.get(self.selected)?.id.clone();
                if self.confirm_delete {
                    self.confirm_delete = false;
                    Some(PickerEvent::Delete(id))
                } else {
                    self.confirm_delete = true;
                    None
                }
            }
            _ => None,
        }
    }
}

/// Transient render wrapper.
pub struct SessionPicker<'a> {
    state: &'a mut SessionPickerState,
}

impl<'a> SessionPicker<'a> {
    pub fn new(state: &'a mut SessionPickerState) -> Self {
        Self { state }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 70, area);
        frame.render_widget(Clear, overlay);

        let help_text = if self.state.confirm_delete {
            " Press d again to delete | any other key cancels "
        } else {
            " n New  d Delete  Enter Open  Esc Back "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Chats ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(help_text).centered())
            .padding(Padding::horizontal(1));

        if self.state.sessions.is_empty() {
            let empty = Paragraph::new("No chats yet. Press n to start one.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let inner_width = overlay.width.saturating_sub(4) as usize; // borders + padding
        let items: Vec<ListItem> = self
            .state
            .sessions
            .iter()
            .enumerate()
            .map(|(i, session)| {
                let style = if i == self.state.selected {
                    let fg = if self.state.confirm_delete {
                        Color::Red
                    } else {
                        Color::White
                    };
                    Style::default()
                        .fg(fg)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(row_line(session, inner_width, style))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}

/// `● <title>      Yesterday  3 messages`
fn row_line(session: &SessionSummary, width: usize, style: Style) -> Line<'static> {
    let marker = if session.is_current { "● " } else { "  " };
    let meta = format!(
        "{}  {}",
        session.date_label,
        message_count_label(session.message_count)
    );
    let title_width = width.saturating_sub(2 + meta.chars().count() + 2);
    let title = truncate_str(&session.title, title_width);

    Line::from(vec![
        Span::styled(marker, style),
        Span::styled(format!("{title:<title_width$}"), style),
        Span::styled("  ", style),
        Span::styled(meta, style),
    ])
}

/// Truncate to `max_width` chars, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        ".".repeat(max_width)
    } else {
        let cut: String = s.chars().take(max_width - 3).collect();
        format!("{cut}...")
    }
}

/// Centered rect using a percentage of the outer rect.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

//! # MessageList Component
//!
//! Scrollable view of the current session's log.
//!
//! `MessageList` is transient (built each frame) and wraps a `&mut
//! MessageListState` that lives in `TuiState`. Heights are measured before
//! rendering so the `ScrollView` canvas can be sized up front; only the rows
//! that intersect the viewport are rendered.
//!
//! While the session has a request in flight, a spinner row with
//! "Analyzing your message..." is appended below the last message.

use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::action::ANALYZING_STATUS;
use crate::core::format::FormattedLine;
use crate::core::message::{Message, MessageId};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageView;
use crate::tui::event::TuiEvent;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const LOADING_ROW_HEIGHT: u16 = 2;

/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    /// Auto-scroll to the bottom on new content
    pub stick_to_bottom: bool,
    /// Height of every message from the last render
    pub heights: Vec<u16>,
    pub viewport_height: u16,
    /// Indices of the messages drawn by the last render
    pub visible: Range<usize>,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true,
            heights: Vec::new(),
            viewport_height: 0,
            visible: 0..0,
        }
    }

    fn max_offset(&self) -> u16 {
        let total: u16 = self.heights.iter().sum();
        total.saturating_sub(self.viewport_height)
    }

    /// Re-engage auto-scroll once the user scrolls back to the bottom.
    fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Whether content exists below the viewport.
    pub fn has_unseen_content(&self) -> bool {
        !self.stick_to_bottom && self.scroll_state.offset().y < self.max_offset()
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp | TuiEvent::CursorUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown | TuiEvent::CursorDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Indices of the messages overlapping `[offset, offset + viewport)`.
fn visible_range(heights: &[u16], offset: u16, viewport: u16) -> Range<usize> {
    let end_y = offset.saturating_add(viewport);
    let mut top = 0u16;
    let mut start = heights.len();
    let mut end = heights.len();
    for (i, &h) in heights.iter().enumerate() {
        let bottom = top + h;
        if start == heights.len() && bottom > offset {
            start = i;
        }
        if top >= end_y {
            end = i;
            break;
        }
        top = bottom;
    }
    start.min(end)..end
}

pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [Message],
    /// Message currently being revealed, with its visible formatted lines
    pub reveal: Option<(&'a MessageId, &'a [FormattedLine])>,
    pub is_submitting: bool,
    pub spinner_frame: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        messages: &'a [Message],
        reveal: Option<(&'a MessageId, &'a [FormattedLine])>,
        is_submitting: bool,
        spinner_frame: usize,
    ) -> Self {
        Self {
            state,
            messages,
            reveal,
            is_submitting,
            spinner_frame,
        }
    }

    fn view(&self, message: &'a Message) -> MessageView<'a> {
        let revealed = self
            .reveal
            .filter(|(id, _)| id.as_str() == message.id())
            .map(|(_, lines)| lines);
        MessageView::new(message, revealed)
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // scrollbar
        let messages = self.messages;
        self.state.heights = messages
            .iter()
            .map(|m| self.view(m).calculate_height(content_width))
            .collect();
        let messages_height: u16 = self.state.heights.iter().sum();
        let loading_height = if self.is_submitting { LOADING_ROW_HEIGHT } else { 0 };
        let canvas_height = messages_height + loading_height;

        // Pin to the bottom, or clamp so we never scroll past the content
        self.state.viewport_height = area.height;
        let max_y = canvas_height.saturating_sub(area.height);
        let current = self.state.scroll_state.offset();
        let offset = if self.state.stick_to_bottom {
            max_y
        } else {
            current.y.min(max_y)
        };
        self.state.scroll_state.set_offset(Position { x: current.x, y: offset });

        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let range = visible_range(&self.state.heights, offset, area.height);
        self.state.visible = range.clone();
        let mut y: u16 = self.state.heights[..range.start].iter().sum();
        for i in range {
            let height = self.state.heights[i];
            let rect = Rect::new(0, y, content_width, height);
            scroll_view.render_widget(self.view(&messages[i]), rect);
            y += height;
        }

        if self.is_submitting {
            let spinner = SPINNER[self.spinner_frame % SPINNER.len()];
            let loading = Paragraph::new(Line::from(vec![
                Span::styled(format!(" {spinner} "), Style::default().fg(Color::Yellow)),
                Span::styled(
                    ANALYZING_STATUS,
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]));
            scroll_view.render_widget(
                loading,
                Rect::new(0, messages_height, content_width, LOADING_ROW_HEIGHT),
            );
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

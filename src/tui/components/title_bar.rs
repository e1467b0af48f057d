//! # TitleBar Component
//!
//! One-line header: app name, current chat title and message count, the
//! transient status message, and the signed-in user on the right.
//!
//! Stateless. All fields are props:
//! - `app_name`, `user`: from `App` (configuration)
//! - `session`: title and count of the current chat, if any
//! - `status_message`: from `App` ("Analyzing your message...")
//! - `has_unseen_content`: from `MessageListState` (scroll position)

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::presenter::message_count_label;
use crate::tui::component::Component;

pub struct TitleBar {
    pub app_name: String,
    /// (title, message count) of the current chat
    pub session: Option<(String, usize)>,
    pub status_message: String,
    pub user: Option<String>,
    pub has_unseen_content: bool,
}

impl TitleBar {
    fn left_text(&self) -> String {
        let mut parts = vec![self.app_name.clone()];
        if let Some((title, count)) = &self.session {
            parts.push(format!("{} ({})", title, message_count_label(*count)));
        }
        if !self.status_message.is_empty() {
            parts.push(self.status_message.clone());
        }
        if self.has_unseen_content {
            parts.push("↓ New".to_string());
        }
        parts.join(" | ")
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let user = self.user.as_deref().unwrap_or("");
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(user.chars().count() as u16)])
                .areas(area);

        frame.render_widget(
            Line::from(Span::styled(
                self.left_text(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            left,
        );
        if !user.is_empty() {
            frame.render_widget(
                Line::from(Span::styled(user.to_string(), Style::default().fg(Color::Cyan))),
                right,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn title_bar() -> TitleBar {
        TitleBar {
            app_name: "Verdict AI".to_string(),
            session: Some(("Quarterly report".to_string(), 3)),
            status_message: String::new(),
            user: None,
            has_unseen_content: false,
        }
    }

    fn rendered(mut bar: TitleBar) -> String {
        let backend = TestBackend::new(80, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_session_header() {
        assert_eq!(title_bar().left_text(), "Verdict AI | Quarterly report (3 messages)");
    }

    #[test]
    fn test_no_session() {
        let bar = TitleBar {
            session: None,
            ..title_bar()
        };
        assert_eq!(bar.left_text(), "Verdict AI");
    }

    #[test]
    fn test_status_and_unseen() {
        let bar = TitleBar {
            status_message: "Analyzing your message...".to_string(),
            has_unseen_content: true,
            ..title_bar()
        };
        let text = rendered(bar);
        assert!(text.contains("Analyzing your message..."));
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn test_user_on_the_right() {
        let bar = TitleBar {
            user: Some("Ada".to_string()),
            ..title_bar()
        };
        let text = rendered(bar);
        assert!(text.trim_end().ends_with("Ada"));
    }
}

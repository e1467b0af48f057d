use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Line;

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, SessionPicker, TitleBar, WelcomeScreen};

/// Layout, top to bottom:
///
/// ```text
/// ┌ title bar (1) ────────────────────────────┐
/// │ messages or welcome screen                │
/// │ validation error (0 or 1)                 │
/// └ input box (3..7) ─────────────────────────┘
/// ```
///
/// The chat picker, when open, is drawn over everything.
pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};

    let input_height = tui.input_box.calculate_height(frame.area().width);
    let error_height = u16::from(app.validation_error.is_some());
    let [title_area, main_area, error_area, input_area] = Layout::vertical([
        Length(1),
        Min(0),
        Length(error_height),
        Length(input_height),
    ])
    .areas(frame.area());

    let current = app.store.current();

    TitleBar {
        app_name: app.app_name.clone(),
        session: current.map(|s| (s.title.clone(), s.messages.len())),
        status_message: app.status_message.clone(),
        user: app.user.as_ref().map(|u| u.display_name.clone()),
        has_unseen_content: tui.message_list.has_unseen_content(),
    }
    .render(frame, title_area);

    match current {
        Some(session) if !session.messages.is_empty() => {
            // Own the revealed lines so the renderer isn't borrowed during layout
            let reveal_id = tui.reveal.current_message().map(str::to_string);
            let reveal_lines = reveal_id
                .as_deref()
                .and_then(|id| tui.reveal.formatted_for(id))
                .map(<[_]>::to_vec);
            let reveal = reveal_id.as_ref().zip(reveal_lines.as_deref());

            MessageList::new(
                &mut tui.message_list,
                &session.messages,
                reveal,
                app.is_submitting(&session.id),
                spinner_frame,
            )
            .render(frame, main_area);

            // A reveal scrolled out of view is finished, not paused
            if let Some(id) = reveal_id
                && let Some(index) = session.messages.iter().position(|m| m.id() == id)
                && !tui.message_list.visible.contains(&index)
            {
                tui.reveal.leave(&id);
            }
        }
        _ => {
            WelcomeScreen {
                app_name: &app.app_name,
                welcome_text: &app.welcome_text,
                user: app.user.as_ref().map(|u| u.display_name.as_str()),
                has_session: current.is_some(),
                highlighted: tui.example_index,
            }
            .render(frame, main_area);
        }
    }

    if let Some(error) = &app.validation_error {
        frame.render_widget(
            Line::styled(format!(" {error}"), Style::default().fg(Color::Red)),
            error_area,
        );
    }

    tui.input_box.render(frame, input_area);

    if let Some(picker) = tui.session_picker.as_mut() {
        SessionPicker::new(picker).render(frame, frame.area());
    }
}

//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Background work
//!
//! `core::update` returns an `Effect`; this module performs it:
//!
//! - `SpawnRequest`: a tokio task calls the gateway and sends the resulting
//!   `Action::RequestFinished` back over an `mpsc` channel.
//! - `StartReveal` / `CancelReveal`: drive the `RevealRenderer`, whose task
//!   sends `RevealFrame`s over a second channel.
//!
//! Both channels are drained after input on every loop iteration.
//!
//! ## Redraw Strategy
//!
//! - **Revealing**: polls every ~16ms so frames land smoothly.
//! - **Submitting**: redraws every ~80ms for the spinner.
//! - **Idle**: sleeps up to 500ms, only redraws on events.

mod command;
mod component;
mod components;
mod event;
mod ui;

use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};

use crate::core::action::{Action, Effect, PendingRequest, update};
use crate::core::attachment::{CandidateFile, format_size};
use crate::core::presenter;
use crate::core::reveal::{DEFAULT_REVEAL_INTERVAL, RevealFrame, RevealRenderer};
use crate::core::state::App;
use crate::gateway::AnalysisGateway;
use crate::tui::command::Command;
use crate::tui::component::EventHandler;
use crate::tui::components::welcome::{EXAMPLE_PROMPTS, next_example};
use crate::tui::components::{
    InputBox, InputEvent, MessageListState, PickerEvent, SessionPickerState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// Chat picker overlay (None = hidden)
    pub session_picker: Option<SessionPickerState>,
    /// The one reveal allowed on screen at a time
    pub reveal: RevealRenderer,
    /// Example prompt last copied into the input
    pub example_index: Option<usize>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_INTERVAL)
    }
}

impl TuiState {
    pub fn new(reveal_interval: Duration) -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            session_picker: None,
            reveal: RevealRenderer::new(reveal_interval),
            example_index: None,
        }
    }

    /// Sync InputBox props with App state.
    fn sync_props(&mut self, app: &App) {
        self.input_box.attachment = app
            .draft
            .attachment
            .as_ref()
            .map(|a| format!("{} ({})", a.name, format_size(a.size_bytes)));
        self.input_box.disabled = app.current_is_submitting();
    }
}

/// Senders handed to background tasks.
struct Channels {
    actions: mpsc::Sender<Action>,
    frames: mpsc::Sender<RevealFrame>,
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter through; ignored where unsupported
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            SetCursorStyle::DefaultUserShape
        );
    }
}

pub fn run(mut app: App, reveal_interval: Duration) -> std::io::Result<()> {
    let mut tui = TuiState::new(reveal_interval);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = match TerminalModeGuard::new() {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!("Failed to enable terminal modes: {}", e);
            None
        }
    };

    let (action_tx, action_rx) = mpsc::channel();
    let (frame_tx, frame_rx) = mpsc::channel();
    let channels = Channels {
        actions: action_tx,
        frames: frame_tx,
    };

    let start_time = Instant::now();
    let mut needs_redraw = true;

    'event_loop: loop {
        tui.sync_props(&app);

        let submitting = app.current_is_submitting();
        let revealing = tui.reveal.is_animating();
        if submitting {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if revealing {
            Duration::from_millis(16)
        } else if submitting {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };

        // Process first event + drain everything pending before the next draw
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_event(&mut app, &mut tui, event, &channels) {
                break 'event_loop;
            }
        }

        while let Ok(action) = action_rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if dispatch(&mut app, &mut tui, action, &channels) {
                break 'event_loop;
            }
        }

        while let Ok(frame) = frame_rx.try_recv() {
            if tui.reveal.apply(frame) {
                needs_redraw = true;
            }
        }
    }

    tui.reveal.cancel();
    if let Err(e) = app.store.flush() {
        warn!("Failed to save sessions on exit: {}", e);
    }

    ratatui::restore();
    Ok(())
}

/// Runs an action through the reducer and performs its effect.
/// Returns true when the app should quit.
fn dispatch(app: &mut App, tui: &mut TuiState, action: Action, channels: &Channels) -> bool {
    match update(app, action) {
        Effect::None => false,
        Effect::Quit => true,
        Effect::SpawnRequest(request) => {
            spawn_request(app.gateway.clone(), request, channels.actions.clone());
            false
        }
        Effect::StartReveal { message_id, text } => {
            let frames = channels.frames.clone();
            tui.reveal
                .start(&message_id, &text, move |frame| frames.send(frame).is_ok());
            false
        }
        Effect::CancelReveal => {
            tui.reveal.cancel();
            tui.message_list = MessageListState::new();
            tui.example_index = None;
            false
        }
    }
}

/// Returns true when the app should quit.
fn handle_event(app: &mut App, tui: &mut TuiState, event: TuiEvent, channels: &Channels) -> bool {
    match event {
        TuiEvent::Resize => return false,
        TuiEvent::ForceQuit => return dispatch(app, tui, Action::Quit, channels),
        _ => {}
    }

    // The picker, when open, takes every other key
    if let Some(picker) = tui.session_picker.as_mut() {
        let Some(picker_event) = picker.handle_event(&event) else {
            return false;
        };
        return match picker_event {
            PickerEvent::Select(id) => {
                tui.session_picker = None;
                dispatch(app, tui, Action::SelectSession(id), channels)
            }
            PickerEvent::CreateNew => {
                tui.session_picker = None;
                dispatch(app, tui, Action::NewSession, channels)
            }
            PickerEvent::Delete(id) => {
                picker.remove_session(&id);
                dispatch(app, tui, Action::DeleteSession(id), channels)
            }
            PickerEvent::Dismiss => {
                tui.session_picker = None;
                false
            }
        };
    }

    match event {
        TuiEvent::Escape => dispatch(app, tui, Action::Quit, channels),
        TuiEvent::NewSession => dispatch(app, tui, Action::NewSession, channels),
        TuiEvent::OpenSessionPicker => {
            open_picker(app, tui);
            false
        }
        TuiEvent::CycleExample => {
            let on_welcome = app.store.current().is_some_and(|s| s.messages.is_empty());
            if on_welcome {
                let index = next_example(tui.example_index);
                tui.input_box.set_text(EXAMPLE_PROMPTS[index]);
                tui.example_index = Some(index);
            }
            false
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::CursorUp
        | TuiEvent::CursorDown => {
            tui.message_list.handle_event(&event);
            false
        }
        _ => match tui.input_box.handle_event(&event) {
            Some(InputEvent::Submit(text)) => run_command(app, tui, text, channels),
            Some(InputEvent::ContentChanged) | None => false,
        },
    }
}

fn open_picker(app: &App, tui: &mut TuiState) {
    let rows = presenter::summarize(&app.store, Local::now());
    tui.session_picker = Some(SessionPickerState::new(rows));
}

/// Acts on a line submitted from the input box.
fn run_command(app: &mut App, tui: &mut TuiState, input: String, channels: &Channels) -> bool {
    match command::parse(&input) {
        Command::Submit { text, action } => {
            let quit = dispatch(app, tui, Action::Submit { text, action }, channels);
            // Rejected locally: give the text back so it can be fixed
            if app.validation_error.is_some() {
                tui.input_box.set_text(&input);
            }
            quit
        }
        Command::Attach(path) => {
            match CandidateFile::from_path(&path) {
                Ok(candidate) => return dispatch(app, tui, Action::AttachFile(candidate), channels),
                Err(e) => {
                    info!("Could not open {}: {}", path.display(), e);
                    app.validation_error = Some(format!("Could not open {}: {}", path.display(), e));
                }
            }
            false
        }
        Command::Detach => dispatch(app, tui, Action::DetachFile, channels),
        Command::NewChat => dispatch(app, tui, Action::NewSession, channels),
        Command::OpenChats => {
            open_picker(app, tui);
            false
        }
        Command::Quit => dispatch(app, tui, Action::Quit, channels),
        Command::Invalid(message) => {
            app.validation_error = Some(message);
            false
        }
    }
}

fn spawn_request(
    gateway: Arc<dyn AnalysisGateway>,
    request: PendingRequest,
    tx: mpsc::Sender<Action>,
) {
    info!(
        "Spawning {:?} via {} for session {}",
        request.kind,
        gateway.name(),
        request.session_id
    );
    tokio::spawn(async move {
        let started = Instant::now();
        let result = request.execute(gateway.as_ref()).await;
        debug!(
            "{:?} finished in {}ms (ok={})",
            request.kind,
            started.elapsed().as_millis(),
            result.is_ok()
        );
        if tx.send(request.finished(result)).is_err() {
            warn!("Failed to send request result: receiver dropped");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{DocumentAction, Message, Payload};
    use crate::core::session::NEW_CHAT_TITLE;
    use crate::test_support::{key_points_summary, test_app};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn channels() -> (Channels, mpsc::Receiver<Action>, mpsc::Receiver<RevealFrame>) {
        let (actions, action_rx) = mpsc::channel();
        let (frames, frame_rx) = mpsc::channel();
        (Channels { actions, frames }, action_rx, frame_rx)
    }

    fn type_and_submit(app: &mut App, tui: &mut TuiState, text: &str, channels: &Channels) {
        tui.input_box.set_text(text);
        handle_event(app, tui, TuiEvent::Submit, channels);
    }

    #[tokio::test]
    async fn test_submit_round_trip_through_channel() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, action_rx, _frames) = channels();
        let id = app.store.create_session();

        type_and_submit(&mut app, &mut tui, "I'm so excited!", &channels);
        assert!(app.is_submitting(&id));
        assert!(tui.input_box.buffer.is_empty());

        let action = tokio::task::spawn_blocking(move || action_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!dispatch(&mut app, &mut tui, action, &channels));

        let messages = &app.store.get(&id).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[1],
            Message::Assistant(m) if matches!(m.payload, Payload::Analysis(_))
        ));
        assert!(!app.is_submitting(&id));
    }

    #[test]
    fn test_rejected_submit_restores_input() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, _actions, _frames) = channels();
        app.store.create_session();

        type_and_submit(&mut app, &mut tui, "/summarize", &channels);
        assert!(app.validation_error.is_some());
        assert_eq!(tui.input_box.buffer, "/summarize");
    }

    #[test]
    fn test_empty_enter_shows_inline_error() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, _actions, _frames) = channels();
        let id = app.store.create_session();

        handle_event(&mut app, &mut tui, TuiEvent::Submit, &channels);
        assert_eq!(
            app.validation_error.as_deref(),
            Some("Please enter some text or attach a document.")
        );
        assert!(app.store.get(&id).unwrap().messages.is_empty());
        assert!(!app.is_submitting(&id));
    }

    #[tokio::test]
    async fn test_reveal_stops_when_scrolled_out_of_view() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, _actions, _frames) = channels();
        let id = app.store.create_session();

        for i in 0..40 {
            app.store
                .append_message(&id, Message::user(format!("message {i}"), None));
        }
        let summary = Message::assistant(
            Payload::Summary(key_points_summary()),
            Some(DocumentAction::Summarize),
        );
        let summary_id = summary.id().to_string();
        app.store.append_message(&id, summary);

        let frames = channels.frames.clone();
        tui.reveal.start(
            &summary_id,
            &key_points_summary().summary_text,
            move |frame| frames.send(frame).is_ok(),
        );

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| ui::draw_ui(f, &app, &mut tui, 0))
            .unwrap();
        // Pinned to the bottom: the summary is on screen and keeps revealing
        assert_eq!(tui.reveal.current_message(), Some(summary_id.as_str()));

        for _ in 0..200 {
            handle_event(&mut app, &mut tui, TuiEvent::ScrollUp, &channels);
        }
        terminal
            .draw(|f| ui::draw_ui(f, &app, &mut tui, 0))
            .unwrap();
        assert!(!tui.message_list.visible.contains(&40));
        assert_eq!(tui.reveal.current_message(), None);
    }

    #[test]
    fn test_attach_missing_file_reports_error() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, _actions, _frames) = channels();
        app.store.create_session();

        type_and_submit(&mut app, &mut tui, "/attach /definitely/not/here.pdf", &channels);
        assert!(app.draft.attachment.is_none());
        assert!(app.validation_error.as_deref().unwrap().starts_with("Could not open"));
    }

    #[test]
    fn test_attach_and_detach_real_file() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, _actions, _frames) = channels();
        app.store.create_session();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        type_and_submit(&mut app, &mut tui, &format!("/attach {}", path.display()), &channels);
        assert_eq!(app.draft.attachment.as_ref().unwrap().name, "notes.txt");
        tui.sync_props(&app);
        assert_eq!(tui.input_box.attachment.as_deref(), Some("notes.txt (5 B)"));

        type_and_submit(&mut app, &mut tui, "/detach", &channels);
        assert!(app.draft.attachment.is_none());
    }

    #[test]
    fn test_picker_flow() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, _actions, _frames) = channels();
        let first = app.store.create_session();
        app.store.create_session();

        handle_event(&mut app, &mut tui, TuiEvent::OpenSessionPicker, &channels);
        assert!(tui.session_picker.is_some());
        // Current (newest) is highlighted first; move to the older chat
        handle_event(&mut app, &mut tui, TuiEvent::CursorDown, &channels);
        handle_event(&mut app, &mut tui, TuiEvent::Submit, &channels);
        assert!(tui.session_picker.is_none());
        assert_eq!(app.store.current_id(), Some(first.as_str()));

        handle_event(&mut app, &mut tui, TuiEvent::OpenSessionPicker, &channels);
        handle_event(&mut app, &mut tui, TuiEvent::InputChar('d'), &channels);
        handle_event(&mut app, &mut tui, TuiEvent::InputChar('d'), &channels);
        assert!(!app.store.contains(&first));
        assert_eq!(tui.session_picker.as_ref().unwrap().sessions.len(), 1);
    }

    #[test]
    fn test_tab_cycles_examples_on_welcome() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, _actions, _frames) = channels();

        // No session: nothing to fill
        handle_event(&mut app, &mut tui, TuiEvent::CycleExample, &channels);
        assert!(tui.input_box.buffer.is_empty());

        let id = app.store.create_session();
        handle_event(&mut app, &mut tui, TuiEvent::CycleExample, &channels);
        assert_eq!(tui.input_box.buffer, EXAMPLE_PROMPTS[0]);
        handle_event(&mut app, &mut tui, TuiEvent::CycleExample, &channels);
        assert_eq!(tui.input_box.buffer, EXAMPLE_PROMPTS[1]);
        assert_eq!(app.store.get(&id).unwrap().title, NEW_CHAT_TITLE);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = test_app();
        let mut tui = TuiState::default();
        let (channels, _actions, _frames) = channels();
        assert!(handle_event(&mut app, &mut tui, TuiEvent::ForceQuit, &channels));
        assert!(handle_event(&mut app, &mut tui, TuiEvent::Escape, &channels));

        // Esc only closes the picker when it's open
        tui.session_picker = Some(SessionPickerState::new(Vec::new()));
        assert!(!handle_event(&mut app, &mut tui, TuiEvent::Escape, &channels));
        assert!(tui.session_picker.is_none());
    }
}

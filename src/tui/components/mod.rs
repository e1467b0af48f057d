//! # TUI Components
//!
//! ### Stateless (props-based rendering)
//!
//! - `TitleBar`: app name, chat header, status, user
//! - `MessageView`: one chat message, per payload kind
//! - `WelcomeScreen`: greeting and example prompts
//!
//! ### Stateful (event-driven)
//!
//! - `InputBox`: text entry and attachment chip
//! - `MessageList`: scrollable log, state in `MessageListState`
//! - `SessionPicker`: chat list overlay, state in `SessionPickerState`
//!
//! Components receive external data as props, never by reaching into `App`:
//!
//! ```rust,ignore
//! // Dependencies are explicit
//! MessageList::new(&mut tui.message_list, &session.messages, reveal, busy, frame)
//! ```
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── title_bar.rs
//! ├── message.rs
//! ├── message_list.rs
//! ├── input_box.rs
//! ├── session_picker.rs
//! └── welcome.rs
//! ```

pub mod input_box;
pub mod message;
pub mod message_list;
pub mod session_picker;
pub mod title_bar;
pub mod welcome;

pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use session_picker::{PickerEvent, SessionPicker, SessionPickerState};
pub use title_bar::TitleBar;
pub use welcome::WelcomeScreen;

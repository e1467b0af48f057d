//! # Application State
//!
//! Core business state for Verdict. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── gateway: Arc<dyn AnalysisGateway>  // remote analysis service
//! ├── store: SessionStore                // sessions + messages, persisted
//! ├── draft: Draft                       // attachment waiting to be sent
//! ├── in_flight: HashSet<SessionId>      // sessions with a request outstanding
//! ├── validation_error: Option<String>   // inline message near the input
//! ├── status_message: String             // status bar text
//! ├── user: Option<UserIdentity>         // display only
//! └── branding                           // app name, welcome text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::attachment::AttachmentDescriptor;
use crate::core::config::{DEFAULT_APP_NAME, DEFAULT_WELCOME_TEXT, ResolvedConfig};
use crate::core::session::{SessionId, SessionStore};
use crate::gateway::AnalysisGateway;

/// Who is signed in. Shown in the title bar; never gates anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub display_name: String,
    pub email: Option<String>,
}

/// Input that hasn't been submitted yet. Text lives in the input widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub attachment: Option<AttachmentDescriptor>,
}

pub struct App {
    pub gateway: Arc<dyn AnalysisGateway>,
    pub store: SessionStore,
    pub draft: Draft,
    /// Sessions with a request in the `Submitting` state. Never persisted.
    pub in_flight: HashSet<SessionId>,
    pub validation_error: Option<String>,
    pub status_message: String,
    pub user: Option<UserIdentity>,
    pub app_name: String,
    pub welcome_text: String,
}

impl App {
    pub fn new(gateway: Arc<dyn AnalysisGateway>, store: SessionStore) -> Self {
        Self {
            gateway,
            store,
            draft: Draft::default(),
            in_flight: HashSet::new(),
            validation_error: None,
            status_message: String::new(),
            user: None,
            app_name: DEFAULT_APP_NAME.to_string(),
            welcome_text: DEFAULT_WELCOME_TEXT.to_string(),
        }
    }

    pub fn from_config(
        gateway: Arc<dyn AnalysisGateway>,
        store: SessionStore,
        config: &ResolvedConfig,
    ) -> Self {
        Self {
            user: config.user.clone(),
            app_name: config.app_name.clone(),
            welcome_text: config.welcome_text.clone(),
            ..Self::new(gateway, store)
        }
    }

    /// True while a request for `session_id` is outstanding.
    pub fn is_submitting(&self, session_id: &str) -> bool {
        self.in_flight.contains(session_id)
    }

    /// True while the current session has a request outstanding.
    pub fn current_is_submitting(&self) -> bool {
        self.store
            .current_id()
            .is_some_and(|id| self.is_submitting(id))
    }

    /// Whether the submit affordance is enabled for `text` in the current session.
    pub fn can_submit(&self, text: &str) -> bool {
        self.store.current().is_some()
            && !self.current_is_submitting()
            && (!text.trim().is_empty() || self.draft.attachment.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_app;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert_eq!(app.app_name, "Verdict AI");
        assert!(app.in_flight.is_empty());
        assert!(app.draft.attachment.is_none());
        assert!(app.user.is_none());
    }

    #[test]
    fn test_can_submit_requires_session_and_content() {
        let mut app = test_app();
        assert!(!app.can_submit("hello"));
        let id = app.store.create_session();
        assert!(app.can_submit("hello"));
        assert!(!app.can_submit("   "));
        app.in_flight.insert(id);
        assert!(!app.can_submit("hello"));
    }
}

//! # Actions
//!
//! Everything that can happen in Verdict becomes an `Action`.
//! User presses Enter? That's `Action::Submit`.
//! The analysis service answers? That's `Action::RequestFinished`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` describing any I/O the adapter must
//! perform (spawn a request, start a reveal). No network calls happen here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! ## Request lifecycle (per session)
//!
//! ```text
//! Idle ──Submit (guard ok)──▶ Submitting ──RequestFinished(Ok)──▶ Succeeded
//!   ▲         │                    │
//!   │    guard fails               └──────RequestFinished(Err)──▶ Failed
//!   └─────────┘ (validation message, no request)
//! ```
//!
//! The user message is appended when entering `Submitting`, so it always
//! precedes the assistant message for the same request.

use std::fmt;

use log::{debug, info, warn};

use crate::core::attachment::{self, AttachmentDescriptor, CandidateFile, RejectedFormat};
use crate::core::message::{DocumentAction, ErrorPayload, Message, MessageId, Payload, RequestKind};
use crate::core::session::{SessionId, SessionUpdate, derive_title};
use crate::core::state::App;
use crate::gateway::{AnalysisGateway, GatewayError};

pub const ANALYZING_STATUS: &str = "Analyzing your message...";

#[derive(Debug)]
pub enum Action {
    NewSession,
    SelectSession(SessionId),
    DeleteSession(SessionId),
    AttachFile(CandidateFile),
    DetachFile,
    /// Submit the input box. `action` is set when the user picked a document action.
    Submit {
        text: String,
        action: Option<DocumentAction>,
    },
    RequestFinished {
        session_id: SessionId,
        kind: RequestKind,
        result: Result<Payload, GatewayError>,
    },
    Quit,
}

/// I/O the adapter performs after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    SpawnRequest(PendingRequest),
    StartReveal { message_id: MessageId, text: String },
    /// The visible session changed; anything being revealed left the view.
    CancelReveal,
}

/// Submission rejected locally, before any request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NoSession,
    EmptySubmission,
    MissingDocument(DocumentAction),
    Rejected(RejectedFormat),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoSession => write!(f, "Start a new chat first."),
            ValidationError::EmptySubmission => {
                write!(f, "Please enter some text or attach a document.")
            }
            ValidationError::MissingDocument(DocumentAction::Summarize) => {
                write!(f, "Please attach a .txt, .pdf, or .docx file to summarize.")
            }
            ValidationError::MissingDocument(DocumentAction::AnalyzeSentiment) => {
                write!(f, "Please attach a .txt, .pdf, or .docx file to analyze.")
            }
            ValidationError::Rejected(rejected) => write!(f, "{rejected}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Everything needed to perform one gateway call off the event loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub session_id: SessionId,
    pub kind: RequestKind,
    pub text: String,
    pub attachment: Option<AttachmentDescriptor>,
}

impl PendingRequest {
    /// Performs the gateway call. Exactly one attempt.
    pub async fn execute(&self, gateway: &dyn AnalysisGateway) -> Result<Payload, GatewayError> {
        match self.kind {
            RequestKind::AnalyzeText => gateway.analyze_text(&self.text).await.map(Payload::Analysis),
            RequestKind::AnalyzeDocument => gateway
                .analyze_document(self.document()?)
                .await
                .map(Payload::Analysis),
            RequestKind::SummarizeDocument => gateway
                .summarize_document(self.document()?)
                .await
                .map(Payload::Summary),
        }
    }

    /// Wraps the outcome of [`execute`](Self::execute) for the event loop.
    pub fn finished(self, result: Result<Payload, GatewayError>) -> Action {
        Action::RequestFinished {
            session_id: self.session_id,
            kind: self.kind,
            result,
        }
    }

    fn document(&self) -> Result<&AttachmentDescriptor, GatewayError> {
        self.attachment
            .as_ref()
            .ok_or_else(|| GatewayError::Attachment("no document attached".to_string()))
    }
}

/// Decides which gateway call a submission becomes.
///
/// An explicit document action needs an attachment. Without one, an attached
/// file is analyzed for sentiment; otherwise the text is.
pub fn route(
    text: &str,
    attachment: Option<&AttachmentDescriptor>,
    action: Option<DocumentAction>,
) -> Result<RequestKind, ValidationError> {
    match (action, attachment) {
        (Some(action), Some(_)) => Ok(RequestKind::for_document(action)),
        (Some(action), None) => Err(ValidationError::MissingDocument(action)),
        (None, Some(_)) => Ok(RequestKind::AnalyzeDocument),
        (None, None) if !text.trim().is_empty() => Ok(RequestKind::AnalyzeText),
        (None, None) => Err(ValidationError::EmptySubmission),
    }
}

/// Title for a session's first submission.
fn first_title(text: &str, kind: RequestKind, attachment: Option<&AttachmentDescriptor>) -> String {
    if !text.trim().is_empty() {
        return derive_title(text);
    }
    let name = attachment.map(|a| a.name.as_str()).unwrap_or("document");
    match kind {
        RequestKind::SummarizeDocument => derive_title(&format!("Summarize {name}")),
        _ => derive_title(&format!("Analyze {name}")),
    }
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::NewSession => {
            app.store.create_session();
            app.validation_error = None;
            Effect::CancelReveal
        }
        Action::SelectSession(id) => {
            if app.store.current_id() == Some(id.as_str()) {
                return Effect::None;
            }
            if app.store.select_session(&id) {
                app.validation_error = None;
                Effect::CancelReveal
            } else {
                Effect::None
            }
        }
        Action::DeleteSession(id) => {
            let was_current = app.store.current_id() == Some(id.as_str());
            if app.store.delete_session(&id) && was_current {
                app.validation_error = None;
                return Effect::CancelReveal;
            }
            Effect::None
        }
        Action::AttachFile(candidate) => {
            match attachment::validate(&candidate) {
                Ok(descriptor) => {
                    info!("Attached {} ({})", descriptor.name, descriptor.mime_hint);
                    app.draft.attachment = Some(descriptor);
                    app.validation_error = None;
                }
                Err(rejected) => {
                    info!("Rejected attachment: {}", rejected.name);
                    app.validation_error = Some(ValidationError::Rejected(rejected).to_string());
                }
            }
            Effect::None
        }
        Action::DetachFile => {
            app.draft.attachment = None;
            Effect::None
        }
        Action::Submit { text, action } => submit(app, text, action),
        Action::RequestFinished {
            session_id,
            kind,
            result,
        } => finish(app, session_id, kind, result),
        Action::Quit => Effect::Quit,
    }
}

fn submit(app: &mut App, text: String, action: Option<DocumentAction>) -> Effect {
    let Some(session) = app.store.current() else {
        app.validation_error = Some(ValidationError::NoSession.to_string());
        return Effect::None;
    };
    let session_id = session.id.clone();
    let rename = session.has_placeholder_title();

    if app.is_submitting(&session_id) {
        debug!("Ignoring submit while {} is in flight", session_id);
        return Effect::None;
    }

    let kind = match route(&text, app.draft.attachment.as_ref(), action) {
        Ok(kind) => kind,
        Err(e) => {
            app.validation_error = Some(e.to_string());
            return Effect::None;
        }
    };

    let text = text.trim().to_string();
    let attachment = app.draft.attachment.take();

    app.store
        .append_message(&session_id, Message::user(text.clone(), attachment.clone()));
    if rename {
        let title = first_title(&text, kind, attachment.as_ref());
        app.store.update_session(
            &session_id,
            SessionUpdate {
                title: Some(title),
            },
        );
    }

    app.in_flight.insert(session_id.clone());
    app.validation_error = None;
    app.status_message = ANALYZING_STATUS.to_string();
    info!("Submitting {:?} for session {}", kind, session_id);

    Effect::SpawnRequest(PendingRequest {
        session_id,
        kind,
        text,
        attachment,
    })
}

fn finish(
    app: &mut App,
    session_id: SessionId,
    kind: RequestKind,
    result: Result<Payload, GatewayError>,
) -> Effect {
    // Cleared whatever happens next, including for a deleted session.
    app.in_flight.remove(&session_id);
    if app.in_flight.is_empty() {
        app.status_message.clear();
    }

    if !app.store.contains(&session_id) {
        debug!("Dropping {:?} result for deleted session {}", kind, session_id);
        return Effect::None;
    }

    let payload = match result {
        Ok(payload) => payload,
        Err(e) => {
            warn!("{} failed for session {}: {}", kind.label(), session_id, e);
            Payload::Error(ErrorPayload {
                message: format!("{} failed: {}", kind.label(), e),
            })
        }
    };

    let reveal_text = match kind {
        RequestKind::SummarizeDocument => payload.reveal_text().map(str::to_string),
        RequestKind::AnalyzeText | RequestKind::AnalyzeDocument => None,
    };
    let message = Message::assistant(payload, kind.document_action());
    let message_id = message.id().to_string();
    app.store.append_message(&session_id, message);

    match reveal_text {
        Some(text) if app.store.current_id() == Some(session_id.as_str()) => {
            Effect::StartReveal { message_id, text }
        }
        _ => Effect::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::attachment::DocumentFormat;
    use crate::core::message::AssistantMessage;
    use crate::core::session::NEW_CHAT_TITLE;
    use crate::gateway::GatewayErrorKind;
    use crate::test_support::{
        ScriptedGateway, joy_result, key_points_summary, test_app, test_app_with,
    };

    fn candidate(name: &str) -> CandidateFile {
        CandidateFile {
            name: name.to_string(),
            size_bytes: 2048,
            content_type: None,
            path: None,
        }
    }

    fn submit_text(app: &mut App, text: &str) -> Effect {
        update(
            app,
            Action::Submit {
                text: text.to_string(),
                action: None,
            },
        )
    }

    fn expect_request(effect: Effect) -> PendingRequest {
        match effect {
            Effect::SpawnRequest(request) => request,
            other => panic!("expected SpawnRequest, got {:?}", other),
        }
    }

    /// Runs a spawned request against the app's gateway and feeds the result back.
    async fn complete(app: &mut App, request: PendingRequest) -> Effect {
        let gateway = app.gateway.clone();
        let result = request.execute(gateway.as_ref()).await;
        update(app, request.finished(result))
    }

    fn assistant(message: &Message) -> &AssistantMessage {
        match message {
            Message::Assistant(m) => m,
            other => panic!("expected assistant message, got {:?}", other),
        }
    }

    fn messages(app: &App, id: &str) -> Vec<Message> {
        app.store.get(id).unwrap().messages.clone()
    }

    #[test]
    fn test_route() {
        let doc = crate::core::attachment::validate(&candidate("a.pdf")).unwrap();
        assert_eq!(route("hi", None, None), Ok(RequestKind::AnalyzeText));
        assert_eq!(route("", Some(&doc), None), Ok(RequestKind::AnalyzeDocument));
        assert_eq!(route("hi", Some(&doc), None), Ok(RequestKind::AnalyzeDocument));
        assert_eq!(
            route("", Some(&doc), Some(DocumentAction::Summarize)),
            Ok(RequestKind::SummarizeDocument)
        );
        assert_eq!(
            route("hi", None, Some(DocumentAction::Summarize)),
            Err(ValidationError::MissingDocument(DocumentAction::Summarize))
        );
        assert_eq!(route("   ", None, None), Err(ValidationError::EmptySubmission));
    }

    #[tokio::test]
    async fn test_text_analysis_success() {
        let mut app = test_app();
        let id = app.store.create_session();

        let request = expect_request(submit_text(&mut app, "I'm so excited!"));
        assert_eq!(request.kind, RequestKind::AnalyzeText);
        assert!(app.is_submitting(&id));
        // User message is visible before the response arrives.
        assert_eq!(messages(&app, &id).len(), 1);

        let effect = complete(&mut app, request).await;
        assert_eq!(effect, Effect::None, "sentiment results are not revealed");
        assert!(!app.is_submitting(&id));

        let log = messages(&app, &id);
        assert_eq!(log.len(), 2);
        match &log[0] {
            Message::User(m) => assert_eq!(m.content, "I'm so excited!"),
            other => panic!("expected user message, got {:?}", other),
        }
        let reply = assistant(&log[1]);
        assert_eq!(reply.payload, Payload::Analysis(joy_result()));
        assert_eq!(reply.action, None);
    }

    #[tokio::test]
    async fn test_document_summarize_reveals() {
        let mut app = test_app();
        let id = app.store.create_session();
        update(&mut app, Action::AttachFile(candidate("report.docx")));
        assert!(app.draft.attachment.is_some());

        let effect = update(
            &mut app,
            Action::Submit {
                text: String::new(),
                action: Some(DocumentAction::Summarize),
            },
        );
        let request = expect_request(effect);
        assert_eq!(request.kind, RequestKind::SummarizeDocument);
        assert_eq!(request.attachment.as_ref().unwrap().extension, DocumentFormat::Docx);
        // Transient input is cleared on submit.
        assert!(app.draft.attachment.is_none());
        assert_eq!(app.store.get(&id).unwrap().title, "Summarize report.docx");

        let effect = complete(&mut app, request).await;
        let log = messages(&app, &id);
        let reply = assistant(&log[1]);
        assert_eq!(reply.action, Some(DocumentAction::Summarize));
        assert_eq!(
            effect,
            Effect::StartReveal {
                message_id: reply.id.clone(),
                text: key_points_summary().summary_text,
            }
        );
    }

    #[tokio::test]
    async fn test_gateway_failure_becomes_error_message() {
        let gateway = Arc::new(ScriptedGateway::failing(GatewayError::BadStatus {
            status: 500,
            message: String::new(),
        }));
        let mut app = test_app_with(gateway);
        let id = app.store.create_session();

        for (action, label) in [
            (None, "Text analysis"),
            (Some(DocumentAction::AnalyzeSentiment), "Document analysis"),
            (Some(DocumentAction::Summarize), "Summarization"),
        ] {
            if action.is_some() {
                update(&mut app, Action::AttachFile(candidate("notes.txt")));
            }
            let effect = update(
                &mut app,
                Action::Submit {
                    text: "please check".to_string(),
                    action,
                },
            );
            let request = expect_request(effect);
            assert_eq!(complete(&mut app, request).await, Effect::None);
            assert!(!app.is_submitting(&id), "in-flight flag cleared after failure");

            let log = messages(&app, &id);
            match &assistant(log.last().unwrap()).payload {
                Payload::Error(e) => {
                    assert!(e.message.starts_with(label), "{}", e.message);
                    assert!(e.message.contains("500"), "{}", e.message);
                }
                other => panic!("expected error payload, got {:?}", other),
            }
        }
        assert_eq!(messages(&app, &id).len(), 6);
    }

    #[test]
    fn test_invalid_file_is_rejected_without_request() {
        let gateway = Arc::new(ScriptedGateway::default());
        let mut app = test_app_with(gateway.clone());
        let id = app.store.create_session();

        let effect = update(&mut app, Action::AttachFile(candidate("image.jpg")));
        assert_eq!(effect, Effect::None);
        assert!(app.draft.attachment.is_none());
        assert!(app.validation_error.as_deref().unwrap().contains("Unsupported format"));

        let effect = update(
            &mut app,
            Action::Submit {
                text: String::new(),
                action: Some(DocumentAction::AnalyzeSentiment),
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(messages(&app, &id).is_empty());
        assert!(!app.is_submitting(&id));
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn test_rejected_file_keeps_previous_attachment() {
        let mut app = test_app();
        app.store.create_session();
        update(&mut app, Action::AttachFile(candidate("ok.pdf")));
        update(&mut app, Action::AttachFile(candidate("bad.exe")));
        assert_eq!(app.draft.attachment.as_ref().unwrap().name, "ok.pdf");
        update(&mut app, Action::DetachFile);
        assert!(app.draft.attachment.is_none());
    }

    #[test]
    fn test_empty_submission_is_validation_error() {
        let mut app = test_app();
        let id = app.store.create_session();
        assert_eq!(submit_text(&mut app, "   "), Effect::None);
        assert_eq!(
            app.validation_error.as_deref(),
            Some("Please enter some text or attach a document.")
        );
        assert!(messages(&app, &id).is_empty());
        assert_eq!(app.store.get(&id).unwrap().title, NEW_CHAT_TITLE);
    }

    #[test]
    fn test_submit_without_session() {
        let mut app = test_app();
        assert_eq!(submit_text(&mut app, "hello"), Effect::None);
        assert_eq!(app.validation_error.as_deref(), Some("Start a new chat first."));
    }

    #[test]
    fn test_second_submit_blocked_while_in_flight() {
        let mut app = test_app();
        let id = app.store.create_session();
        expect_request(submit_text(&mut app, "first"));
        assert_eq!(submit_text(&mut app, "second"), Effect::None);
        assert_eq!(messages(&app, &id).len(), 1);
    }

    #[test]
    fn test_in_flight_is_per_session() {
        let mut app = test_app();
        let a = app.store.create_session();
        expect_request(submit_text(&mut app, "from a"));
        let b = app.store.create_session();
        expect_request(submit_text(&mut app, "from b"));
        assert!(app.is_submitting(&a));
        assert!(app.is_submitting(&b));
    }

    #[tokio::test]
    async fn test_title_rewritten_once() {
        let mut app = test_app();
        let id = app.store.create_session();
        assert_eq!(app.store.get(&id).unwrap().title, NEW_CHAT_TITLE);

        let request = expect_request(submit_text(
            &mut app,
            "This is really frustrating and disappointing.",
        ));
        assert_eq!(app.store.get(&id).unwrap().title, "This is really frustrating and...");
        complete(&mut app, request).await;

        let request = expect_request(submit_text(&mut app, "Something else"));
        complete(&mut app, request).await;
        assert_eq!(app.store.get(&id).unwrap().title, "This is really frustrating and...");
    }

    #[tokio::test]
    async fn test_user_message_precedes_reply() {
        let mut app = test_app();
        let id = app.store.create_session();
        for text in ["one", "two", "three"] {
            let request = expect_request(submit_text(&mut app, text));
            complete(&mut app, request).await;
        }
        let roles: Vec<bool> = messages(&app, &id).iter().map(Message::is_user).collect();
        assert_eq!(roles, vec![true, false, true, false, true, false]);
    }

    #[tokio::test]
    async fn test_deleted_session_completion_is_noop() {
        let mut app = test_app();
        let a = app.store.create_session();
        let request = expect_request(submit_text(&mut app, "doomed"));
        let b = app.store.create_session();

        assert_eq!(update(&mut app, Action::DeleteSession(a.clone())), Effect::None);
        let effect = complete(&mut app, request).await;

        assert_eq!(effect, Effect::None);
        assert!(!app.is_submitting(&a));
        assert!(app.store.get(&a).is_none());
        assert!(messages(&app, &b).is_empty());
    }

    #[tokio::test]
    async fn test_summary_for_background_session_is_not_revealed() {
        let mut app = test_app();
        let a = app.store.create_session();
        update(&mut app, Action::AttachFile(candidate("report.pdf")));
        let request = expect_request(update(
            &mut app,
            Action::Submit {
                text: String::new(),
                action: Some(DocumentAction::Summarize),
            },
        ));
        app.store.create_session();

        assert_eq!(complete(&mut app, request).await, Effect::None);
        assert_eq!(messages(&app, &a).len(), 2);
    }

    #[test]
    fn test_missing_attachment_at_execute_is_typed_error() {
        let request = PendingRequest {
            session_id: "s".into(),
            kind: RequestKind::SummarizeDocument,
            text: String::new(),
            attachment: None,
        };
        let gateway = ScriptedGateway::default();
        let err = tokio_test::block_on(request.execute(&gateway)).unwrap_err();
        assert_eq!(err.kind(), GatewayErrorKind::Attachment);
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn test_session_navigation_cancels_reveal() {
        let mut app = test_app();
        let a = app.store.create_session();
        assert_eq!(update(&mut app, Action::NewSession), Effect::CancelReveal);
        assert_eq!(update(&mut app, Action::SelectSession(a.clone())), Effect::CancelReveal);
        assert_eq!(update(&mut app, Action::SelectSession(a.clone())), Effect::None);
        assert_eq!(update(&mut app, Action::SelectSession("nope".into())), Effect::None);
        assert_eq!(update(&mut app, Action::DeleteSession(a)), Effect::CancelReveal);
        assert_eq!(app.store.current_id(), None);
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}

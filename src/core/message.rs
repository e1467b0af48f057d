//! # Messages
//!
//! One entry in a session's log. The assistant payload is a closed sum type
//! decided when the message is built, so rendering is an exhaustive match
//! rather than a check for which fields happen to be present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::attachment::AttachmentDescriptor;
use crate::gateway::{AnalysisResult, SummaryResult};

pub type MessageId = String;

/// Which document operation the user asked for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    AnalyzeSentiment,
    Summarize,
}

/// The three gateway calls a submission can turn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    AnalyzeText,
    AnalyzeDocument,
    SummarizeDocument,
}

impl RequestKind {
    /// Name used in error messages ("Summarization failed: ...").
    pub fn label(self) -> &'static str {
        match self {
            RequestKind::AnalyzeText => "Text analysis",
            RequestKind::AnalyzeDocument => "Document analysis",
            RequestKind::SummarizeDocument => "Summarization",
        }
    }

    /// The tag stored on the assistant message. Plain text analysis has none.
    pub fn document_action(self) -> Option<DocumentAction> {
        match self {
            RequestKind::AnalyzeText => None,
            RequestKind::AnalyzeDocument => Some(DocumentAction::AnalyzeSentiment),
            RequestKind::SummarizeDocument => Some(DocumentAction::Summarize),
        }
    }

    pub fn for_document(action: DocumentAction) -> Self {
        match action {
            DocumentAction::AnalyzeSentiment => RequestKind::AnalyzeDocument,
            DocumentAction::Summarize => RequestKind::SummarizeDocument,
        }
    }
}

/// A terminal failure. Never retried automatically.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Analysis(AnalysisResult),
    Summary(SummaryResult),
    Error(ErrorPayload),
}

impl Payload {
    /// Long-form text worth revealing progressively.
    pub fn reveal_text(&self) -> Option<&str> {
        match self {
            Payload::Summary(summary) => Some(&summary.summary_text),
            Payload::Analysis(_) | Payload::Error(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub id: MessageId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentDescriptor>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    pub id: MessageId,
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<DocumentAction>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
}

fn new_message_id() -> MessageId {
    uuid::Uuid::new_v4().to_string()
}

impl Message {
    pub fn user(content: impl Into<String>, attachment: Option<AttachmentDescriptor>) -> Self {
        Message::User(UserMessage {
            id: new_message_id(),
            content: content.into(),
            attachment,
            created_at: Utc::now(),
        })
    }

    pub fn assistant(payload: Payload, action: Option<DocumentAction>) -> Self {
        Message::Assistant(AssistantMessage {
            id: new_message_id(),
            payload,
            action,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Message::User(m) => &m.id,
            Message::Assistant(m) => &m.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Message::User(m) => m.created_at,
            Message::Assistant(m) => m.created_at,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User(_))
    }
}

//! # Session List Presentation
//!
//! Pure derivations for the chat picker: relative date labels and per-session
//! summary rows. Nothing here holds state.

use chrono::{DateTime, TimeZone, Utc};

use crate::core::session::{Session, SessionStore};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// "Today", "Yesterday", "<n> days ago", or a calendar date in `now`'s timezone.
///
/// Uses whole days, rounded up: anything within the last 24 hours is "Today",
/// within 48 hours "Yesterday", and so on up to a week.
pub fn relative_label<Tz>(created_at: DateTime<Utc>, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let elapsed_ms = (now.with_timezone(&Utc) - created_at).num_milliseconds().abs();
    let days = (elapsed_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;

    match days {
        0 | 1 => "Today".to_string(),
        2 => "Yesterday".to_string(),
        3..=7 => format!("{} days ago", days - 1),
        _ => created_at
            .with_timezone(&now.timezone())
            .format("%b %-d, %Y")
            .to_string(),
    }
}

/// "1 message" / "3 messages".
pub fn message_count_label(count: usize) -> String {
    if count == 1 {
        "1 message".to_string()
    } else {
        format!("{count} messages")
    }
}

/// One row of the chat picker.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub date_label: String,
    pub message_count: usize,
    pub is_current: bool,
}

impl SessionSummary {
    fn from_session<Tz>(session: &Session, now: &DateTime<Tz>, current: Option<&str>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            date_label: relative_label(session.created_at, now.clone()),
            message_count: session.messages.len(),
            is_current: current == Some(session.id.as_str()),
        }
    }
}

/// Summaries for every session, in store order (most recent first).
pub fn summarize<Tz>(store: &SessionStore, now: DateTime<Tz>) -> Vec<SessionSummary>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    store
        .sessions()
        .iter()
        .map(|s| SessionSummary::from_session(s, &now, store.current_id()))
        .collect()
}

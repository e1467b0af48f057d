//! # Session Store
//!
//! Owns every chat session and its message log. The whole ordered list
//! (most recent first) is serialized to a single storage key after every
//! mutation and read back once in [`SessionStore::init`].
//!
//! Updates addressed to an unknown session id are silently ignored. A
//! request can finish after its session was deleted, and that is not an error.
//!
//! File writes use atomic rename (write `.tmp`, then `rename()`) for crash safety.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::message::Message;

/// Title every session starts with. Replaced once, on the first submission.
pub const NEW_CHAT_TITLE: &str = "New Chat";
/// Storage key holding the serialized session list.
pub const DEFAULT_STORAGE_KEY: &str = "verdict-chats";
/// Titles longer than this many characters are cut and suffixed with "...".
pub const TITLE_MAX_CHARS: usize = 30;

pub type SessionId = String;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: new_session_id(),
            title: NEW_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// True until the first submission renames the session.
    pub fn has_placeholder_title(&self) -> bool {
        self.title == NEW_CHAT_TITLE
    }
}

/// Fields that may be merged into an existing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub title: Option<String>,
}

/// Generate a new UUID v4 session ID.
pub fn new_session_id() -> SessionId {
    uuid::Uuid::new_v4().to_string()
}

/// Derive a session title from submitted text: the first line, trimmed,
/// cut to [`TITLE_MAX_CHARS`] characters.
pub fn derive_title(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.chars().count() > TITLE_MAX_CHARS {
        let cut: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        first_line.to_string()
    }
}

// ============================================================================
// Durable storage
// ============================================================================

/// A single named slot holding the serialized session list.
pub trait Storage {
    /// Returns `None` when nothing has been stored yet.
    fn load(&self) -> io::Result<Option<String>>;
    /// Overwrites the slot.
    fn save(&self, blob: &str) -> io::Result<()>;
}

/// Stores the blob as `<dir>/<key>.json`.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Creates `dir` if needed.
    pub fn new(dir: &Path, key: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(format!("{key}.json")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> io::Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path).map(Some)
    }

    fn save(&self, blob: &str) -> io::Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, blob)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory slot. Clones share the same contents, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(blob: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(blob.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|b| b.clone())
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> io::Result<Option<String>> {
        let guard = self
            .blob
            .lock()
            .map_err(|_| io::Error::other("memory storage lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, blob: &str) -> io::Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| io::Error::other("memory storage lock poisoned"))?;
        *guard = Some(blob.to_string());
        Ok(())
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct SessionStore {
    storage: Box<dyn Storage>,
    sessions: Vec<Session>,
    current: Option<SessionId>,
}

impl SessionStore {
    /// Loads the session list from `storage`. A missing key yields an empty
    /// store; an unreadable or corrupt blob is logged and also yields an empty
    /// store rather than failing startup.
    pub fn init(storage: Box<dyn Storage>) -> Self {
        let sessions = match storage.load() {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Session>>(&json) {
                Ok(sessions) => {
                    info!("Loaded {} sessions", sessions.len());
                    sessions
                }
                Err(e) => {
                    warn!("Stored sessions are corrupt, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No stored sessions");
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read stored sessions, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            storage,
            sessions,
            current: None,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_deref().and_then(|id| self.get(id))
    }

    /// Inserts a fresh session at the head of the list and makes it current.
    pub fn create_session(&mut self) -> SessionId {
        let session = Session::new();
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.current = Some(id.clone());
        debug!("Created session {}", id);
        self.persist();
        id
    }

    /// Points the current session at `id`. Returns false if it doesn't exist.
    pub fn select_session(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.current = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Merges `update` into the session. Unknown ids are ignored.
    pub fn update_session(&mut self, id: &str, update: SessionUpdate) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) else {
            debug!("Ignoring update for missing session {}", id);
            return false;
        };
        if let Some(title) = update.title {
            session.title = title;
        }
        self.persist();
        true
    }

    /// Removes the session; clears the current pointer if it pointed there.
    pub fn delete_session(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        let removed = self.sessions.len() != before;
        if removed {
            debug!("Deleted session {}", id);
            self.persist();
        }
        removed
    }

    /// Appends to the end of the session's log. Unknown ids are ignored.
    pub fn append_message(&mut self, id: &str, message: Message) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) else {
            debug!("Ignoring message for missing session {}", id);
            return false;
        };
        session.messages.push(message);
        self.persist();
        true
    }

    /// Serializes the full session list to storage.
    pub fn flush(&self) -> io::Result<()> {
        let json = serde_json::to_string(&self.sessions)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.storage.save(&json)
    }

    fn persist(&self) {
        if let Err(e) = self.flush() {
            warn!("Failed to save sessions: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attachment::{AttachmentDescriptor, DocumentFormat};
    use crate::core::message::{DocumentAction, ErrorPayload, Payload};

    fn memory_store() -> (SessionStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        (SessionStore::init(Box::new(storage.clone())), storage)
    }

    #[test]
    fn test_create_inserts_at_head_and_selects() {
        let (mut store, _) = memory_store();
        let first = store.create_session();
        let second = store.create_session();
        assert_eq!(store.sessions()[0].id, second);
        assert_eq!(store.sessions()[1].id, first);
        assert_eq!(store.current_id(), Some(second.as_str()));
        assert_eq!(store.current().map(|s| s.title.as_str()), Some(NEW_CHAT_TITLE));
    }

    #[test]
    fn test_update_missing_session_is_noop() {
        let (mut store, storage) = memory_store();
        let applied = store.update_session(
            "missing",
            SessionUpdate {
                title: Some("x".into()),
            },
        );
        assert!(!applied);
        assert!(storage.contents().is_none());
    }

    #[test]
    fn test_update_merges_title() {
        let (mut store, _) = memory_store();
        let id = store.create_session();
        store.update_session(
            &id,
            SessionUpdate {
                title: Some("Renamed".into()),
            },
        );
        assert_eq!(store.get(&id).unwrap().title, "Renamed");
        // An empty update leaves the title alone.
        store.update_session(&id, SessionUpdate::default());
        assert_eq!(store.get(&id).unwrap().title, "Renamed");
    }

    #[test]
    fn test_delete_current_clears_pointer() {
        let (mut store, _) = memory_store();
        let a = store.create_session();
        let b = store.create_session();
        assert!(store.delete_session(&b));
        assert_eq!(store.current_id(), None);
        assert!(store.contains(&a));

        store.select_session(&a);
        assert!(!store.delete_session(&b));
        assert_eq!(store.current_id(), Some(a.as_str()));
    }

    #[test]
    fn test_delete_other_keeps_pointer() {
        let (mut store, _) = memory_store();
        let a = store.create_session();
        let b = store.create_session();
        store.delete_session(&a);
        assert_eq!(store.current_id(), Some(b.as_str()));
    }

    #[test]
    fn test_append_preserves_order_and_duplicates() {
        let (mut store, _) = memory_store();
        let id = store.create_session();
        let one = Message::user("same", None);
        let two = Message::user("same", None);
        let three = Message::assistant(
            Payload::Error(ErrorPayload {
                message: "x".into(),
            }),
            None,
        );
        let ids: Vec<String> = [&one, &two, &three].iter().map(|m| m.id().to_string()).collect();
        store.append_message(&id, one);
        store.append_message(&id, two);
        store.append_message(&id, three);

        let stored: Vec<&str> = store.get(&id).unwrap().messages.iter().map(|m| m.id()).collect();
        assert_eq!(stored, ids);
    }

    #[test]
    fn test_append_to_missing_session_is_noop() {
        let (mut store, _) = memory_store();
        let id = store.create_session();
        assert!(!store.append_message("gone", Message::user("hi", None)));
        assert!(store.get(&id).unwrap().messages.is_empty());
    }

    #[test]
    fn test_every_mutation_is_persisted_and_reloads() {
        let (mut store, storage) = memory_store();
        let id = store.create_session();
        store.append_message(
            &id,
            Message::user(
                "",
                Some(AttachmentDescriptor {
                    name: "report.docx".into(),
                    size_bytes: 42,
                    mime_hint: DocumentFormat::Docx.mime().into(),
                    extension: DocumentFormat::Docx,
                    source: Some(PathBuf::from("/tmp/report.docx")),
                }),
            ),
        );
        store.append_message(
            &id,
            Message::assistant(
                Payload::Error(ErrorPayload {
                    message: "Summarization failed".into(),
                }),
                Some(DocumentAction::Summarize),
            ),
        );

        let reloaded = SessionStore::init(Box::new(storage.clone()));
        assert_eq!(reloaded.sessions().len(), 1);
        let session = &reloaded.sessions()[0];
        assert_eq!(session.id, id);
        assert_eq!(session.messages.len(), 2);
        // The upload handle does not survive a reload; the rest does.
        match &session.messages[0] {
            Message::User(m) => {
                let attachment = m.attachment.as_ref().unwrap();
                assert_eq!(attachment.name, "report.docx");
                assert_eq!(attachment.source, None);
            }
            other => panic!("expected user message, got {:?}", other),
        }
        assert_eq!(session.messages[1], store.get(&id).unwrap().messages[1]);
        // The current pointer is not persisted.
        assert_eq!(reloaded.current_id(), None);
    }

    #[test]
    fn test_corrupt_blob_starts_empty() {
        let store = SessionStore::init(Box::new(MemoryStorage::with_contents("{not json")));
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), DEFAULT_STORAGE_KEY).unwrap();
        assert!(storage.load().unwrap().is_none());

        let mut store = SessionStore::init(Box::new(storage));
        let id = store.create_session();
        store.append_message(&id, Message::user("hello", None));

        let path = dir.path().join("verdict-chats.json");
        assert!(path.exists());
        assert!(!dir.path().join("verdict-chats.tmp").exists());

        let reopened = SessionStore::init(Box::new(
            FileStorage::new(dir.path(), DEFAULT_STORAGE_KEY).unwrap(),
        ));
        assert_eq!(reopened.get(&id).unwrap().messages.len(), 1);
    }

    #[test]
    fn test_derive_title_short_text() {
        assert_eq!(derive_title("  I'm so excited!  "), "I'm so excited!");
    }

    #[test]
    fn test_derive_title_truncates() {
        let title = derive_title(&"a".repeat(80));
        assert_eq!(title, format!("{}...", "a".repeat(TITLE_MAX_CHARS)));
    }

    #[test]
    fn test_derive_title_first_line_and_multibyte() {
        assert_eq!(derive_title("First line\nSecond"), "First line");
        let long = "é".repeat(40);
        assert_eq!(derive_title(&long).chars().count(), TITLE_MAX_CHARS + 3);
    }
}

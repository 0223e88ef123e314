use log::info;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::roster::Roster;

/// Name of the cookie that carries the session id.
pub const SESSION_COOKIE: &str = "session";

/// Event shown when the request does not name one.
pub const DEFAULT_EVENT: &str = "Boda Juan y Marta";

/// Read the event name from the `id` query value. Underscores stand for
/// spaces so that links can avoid `%20`.
pub fn event_from_query(id: Option<&str>, default_event: &str) -> String {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => id.replace('_', " "),
        _ => default_event.to_string(),
    }
}

/// The event being edited and its in-memory guests.
#[derive(Clone, Debug)]
pub struct Workspace {
    pub event: String,
    pub roster: Roster,
}

/// One-shot message shown on the next page render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// State of one browser session
///
/// The workspace is created on the first visit to an event, replaced when a
/// different event is requested (unsaved edits are dropped), and discarded
/// on logout together with the rest of the session.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub authenticated: bool,
    pub workspace: Option<Workspace>,
    pub notice: Option<Notice>,
}

impl Session {
    /// True when the workspace already holds `event`.
    pub fn has_event(&self, event: &str) -> bool {
        self.workspace.as_ref().is_some_and(|w| w.event == event)
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

/// Single shared password. Compared as-is, no lockout, no expiry.
#[derive(Clone)]
pub struct PasswordGate {
    secret: String,
}

impl PasswordGate {
    pub fn new(secret: impl Into<String>) -> Self {
        PasswordGate {
            secret: secret.into(),
        }
    }

    pub fn check(&self, attempt: &str) -> bool {
        !self.secret.is_empty() && attempt == self.secret
    }
}

impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordGate(..)")
    }
}

/// All live sessions, keyed by cookie value.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start an anonymous session and return its id.
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock().insert(id.clone(), Session::default());
        info!("session created");
        id
    }

    pub fn exists(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn is_authenticated(&self, id: &str) -> bool {
        self.lock().get(id).is_some_and(|s| s.authenticated)
    }

    /// Run `f` against the session, if it exists.
    pub fn with<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        self.lock().get_mut(id).map(f)
    }

    /// Drop the session and everything it holds.
    pub fn remove(&self, id: &str) -> Option<Session> {
        self.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

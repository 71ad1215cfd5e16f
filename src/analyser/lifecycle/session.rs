//! Per-session "current file" pointers.

use crate::error::{Result, StewardError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A session's current file name, behind the lock that serializes every
/// cleaning call for that session.
pub type SessionSlot = Arc<Mutex<Option<String>>>;

/// Keyed store of session pointers. Sessions never see each other's slots.
pub trait SessionStore: Send + Sync {
    /// The slot for `session`, created empty on first use.
    fn slot(&self, session: &str) -> Result<SessionSlot>;

    /// The slot for a session that already exists. Never creates one.
    fn existing_slot(&self, session: &str) -> Result<SessionSlot>;

    /// Current file name, without creating the session.
    fn peek(&self, session: &str) -> Result<Option<String>>;

    /// Drop the session and return its last pointer.
    fn end(&self, session: &str) -> Result<Option<String>>;

    fn get_current(&self, session: &str) -> Result<String> {
        self.peek(session)?.ok_or_else(|| {
            StewardError::NotFound(format!("session '{session}' has no uploaded file"))
        })
    }

    /// Unconditionally overwrite the pointer.
    fn set_current(&self, session: &str, file_name: &str) -> Result<()> {
        let slot = self.slot(session)?;
        *lock_slot(&slot)? = Some(file_name.to_owned());
        Ok(())
    }
}

pub fn lock_slot(slot: &SessionSlot) -> Result<MutexGuard<'_, Option<String>>> {
    slot.lock()
        .map_err(|e| StewardError::Internal(format!("Lock poisoned: {e}")))
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionSlot>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions().map_or(0, |sessions| sessions.len())
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, SessionSlot>>> {
        self.sessions
            .lock()
            .map_err(|e| StewardError::Internal(format!("Lock poisoned: {e}")))
    }
}

impl SessionStore for InMemorySessionStore {
    fn slot(&self, session: &str) -> Result<SessionSlot> {
        let mut sessions = self.sessions()?;
        Ok(Arc::clone(sessions.entry(session.to_owned()).or_default()))
    }

    fn existing_slot(&self, session: &str) -> Result<SessionSlot> {
        self.sessions()?
            .get(session)
            .map(Arc::clone)
            .ok_or_else(|| {
                StewardError::NotFound(format!("session '{session}' has no uploaded file"))
            })
    }

    fn peek(&self, session: &str) -> Result<Option<String>> {
        let slot = self.sessions()?.get(session).map(Arc::clone);
        match slot {
            Some(slot) => Ok(lock_slot(&slot)?.clone()),
            None => Ok(None),
        }
    }

    fn end(&self, session: &str) -> Result<Option<String>> {
        let slot = self.sessions()?.remove(session);
        match slot {
            Some(slot) => Ok(lock_slot(&slot)?.take()),
            None => Ok(None),
        }
    }
}

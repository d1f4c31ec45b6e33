//! Per-tab task registry: the cancellation mechanism.
//!
//! Each typing task registers a fresh token for its tab. The running loop
//! re-checks before every character that the registry still maps the tab to
//! its own token; removing or replacing the entry is how a task is cancelled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::driver::{DebugSession, TabId};

/// Generation number identifying one typing task.
pub type TaskToken = u64;

#[derive(Debug)]
struct TaskEntry {
    token: TaskToken,
    /// Set once the task has attached; released by whoever removes the entry.
    session: Option<DebugSession>,
}

/// A task entry taken out of the registry.
#[derive(Debug)]
pub struct RemovedTask {
    pub token: TaskToken,
    pub session: Option<DebugSession>,
}

/// Mapping from tab to the token of its current typing task.
///
/// The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    entries: Mutex<HashMap<TabId, TaskEntry>>,
    next_token: AtomicU64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task for `tab` unless one is already running.
    pub fn try_register(&self, tab: &TabId) -> Option<TaskToken> {
        let mut entries = self.entries.lock();
        if entries.contains_key(tab) {
            return None;
        }
        let token = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        entries.insert(
            tab.clone(),
            TaskEntry {
                token,
                session: None,
            },
        );
        Some(token)
    }

    /// Whether `token` is still the current task for `tab`.
    pub fn is_current(&self, tab: &TabId, token: TaskToken) -> bool {
        self.entries
            .lock()
            .get(tab)
            .is_some_and(|entry| entry.token == token)
    }

    /// Record the session a task attached.
    ///
    /// Hands the session back if the task was stopped or superseded while it
    /// was attaching; the caller then owns the release.
    pub fn bind_session(
        &self,
        tab: &TabId,
        token: TaskToken,
        session: DebugSession,
    ) -> Result<(), DebugSession> {
        match self.entries.lock().get_mut(tab) {
            Some(entry) if entry.token == token => {
                entry.session = Some(session);
                Ok(())
            }
            _ => Err(session),
        }
    }

    /// Remove whatever task is registered for `tab`.
    pub fn remove(&self, tab: &TabId) -> Option<RemovedTask> {
        self.entries.lock().remove(tab).map(|entry| RemovedTask {
            token: entry.token,
            session: entry.session,
        })
    }

    /// Remove the entry for `tab` only if it still belongs to `token`.
    pub fn remove_if_current(&self, tab: &TabId, token: TaskToken) -> Option<RemovedTask> {
        let mut entries = self.entries.lock();
        if entries.get(tab)?.token != token {
            return None;
        }
        entries.remove(tab).map(|entry| RemovedTask {
            token: entry.token,
            session: entry.session,
        })
    }

    pub fn contains(&self, tab: &TabId) -> bool {
        self.entries.lock().contains_key(tab)
    }

    /// Tabs with a task in flight.
    pub fn tabs(&self) -> Vec<TabId> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

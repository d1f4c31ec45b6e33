//! The typing engine: per-tab typing tasks, stop, and force-paste.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clipboard::ClipboardReader;
use crate::driver::{DebugSession, DebugSessionDriver, TabId};
use crate::pacing::PacingSettings;
use crate::registry::{TaskRegistry, TaskToken};
use crate::settings::SettingsStore;

/// How a typing task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingOutcome {
    /// Every character was injected.
    Completed { typed: usize },
    /// Stopped or superseded before the text ran out.
    Cancelled { typed: usize },
    /// Neither explicit text nor clipboard text was available.
    NothingToType,
    /// No debugging session could be established.
    AttachFailed(String),
    /// The page rejected a character; the rest were skipped.
    InjectionFailed { typed: usize, error: String },
}

/// How a force-paste ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    Pasted { chars: usize },
    NothingToPaste,
    AttachFailed(String),
    InjectionFailed(String),
}

/// The operations menu clicks, shortcuts and messages are translated into.
#[async_trait]
pub trait TypingControl: Send + Sync {
    /// Start a paced typing task for `tab`.
    ///
    /// Returns `None` without side effects when the tab already has a task.
    /// The returned handle resolves when the task ends; dropping it does not
    /// cancel the task.
    fn start_typing(&self, tab: TabId, text: Option<String>) -> Option<JoinHandle<TypingOutcome>>;

    /// Cancel the tab's typing task. Returns `false` if none was running.
    async fn stop_typing(&self, tab: &TabId) -> bool;

    /// Insert the whole text at once, bypassing pacing and the task registry.
    async fn force_paste(&self, tab: &TabId, text: Option<String>) -> PasteOutcome;
}

/// Drives paced typing through a [`DebugSessionDriver`].
#[derive(Clone)]
pub struct TypingEngine {
    driver: Arc<dyn DebugSessionDriver>,
    clipboard: Arc<dyn ClipboardReader>,
    settings: Arc<dyn SettingsStore>,
    registry: Arc<TaskRegistry>,
}

impl TypingEngine {
    pub fn new(
        driver: Arc<dyn DebugSessionDriver>,
        clipboard: Arc<dyn ClipboardReader>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            driver,
            clipboard,
            settings,
            registry: Arc::new(TaskRegistry::new()),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Whether a typing task is in flight for `tab`.
    pub fn is_typing(&self, tab: &TabId) -> bool {
        self.registry.contains(tab)
    }

    /// Tabs with a typing task in flight.
    pub fn active_tabs(&self) -> Vec<TabId> {
        self.registry.tabs()
    }

    /// Body of a typing task, from attach to cleanup.
    async fn run_task(&self, tab: TabId, token: TaskToken, text: Option<String>) -> TypingOutcome {
        let session = match self.driver.attach(&tab).await {
            Ok(session) => session,
            Err(e) => {
                warn!(tab = %tab, "{}", e);
                self.registry.remove_if_current(&tab, token);
                return TypingOutcome::AttachFailed(e.to_string());
            }
        };

        // From here on the registry entry owns the session.
        if let Err(session) = self.registry.bind_session(&tab, token, session.clone()) {
            debug!(tab = %tab, "Typing stopped while attaching");
            self.release(&session).await;
            return TypingOutcome::Cancelled { typed: 0 };
        }

        let text = self.resolve_text(&tab, text).await;
        if text.is_empty() {
            info!(tab = %tab, "Nothing to type");
            self.finish(&tab, token).await;
            return TypingOutcome::NothingToType;
        }

        let pacing = self.load_pacing().await;
        let total = text.chars().count();
        info!(
            tab = %tab,
            chars = total,
            wpm = pacing.base_wpm(),
            "Typing started"
        );

        let outcome = self.type_chars(&tab, token, &session, &text, pacing).await;

        match &outcome {
            TypingOutcome::Completed { typed } => info!(tab = %tab, typed, "Typing finished"),
            TypingOutcome::Cancelled { typed } => info!(tab = %tab, typed, total, "Typing cancelled"),
            TypingOutcome::InjectionFailed { typed, error } => {
                warn!(tab = %tab, typed, "Failed to type character: {}", error)
            }
            _ => {}
        }

        self.finish(&tab, token).await;
        outcome
    }

    /// The per-character loop: check, inject, pause.
    async fn type_chars(
        &self,
        tab: &TabId,
        token: TaskToken,
        session: &DebugSession,
        text: &str,
        pacing: PacingSettings,
    ) -> TypingOutcome {
        let mut chars = text.chars().peekable();
        let mut typed = 0;
        let mut buf = [0u8; 4];

        while let Some(ch) = chars.next() {
            if !self.registry.is_current(tab, token) {
                return TypingOutcome::Cancelled { typed };
            }

            if let Err(e) = self.driver.insert_text(session, ch.encode_utf8(&mut buf)).await {
                // A stop while the insert was in flight detaches the session
                // under it; that rejection is the stop, not a failure.
                if !self.registry.is_current(tab, token) {
                    debug!(tab = %tab, "Insert rejected after stop: {}", e);
                    return TypingOutcome::Cancelled { typed };
                }
                return TypingOutcome::InjectionFailed {
                    typed,
                    error: e.to_string(),
                };
            }
            typed += 1;

            if chars.peek().is_some() {
                let delay = pacing.next_delay(&mut rand::thread_rng());
                tokio::time::sleep(delay).await;
            }
        }

        TypingOutcome::Completed { typed }
    }

    /// Explicit text if given and non-empty, otherwise the tab's clipboard.
    async fn resolve_text(&self, tab: &TabId, explicit: Option<String>) -> String {
        match explicit {
            Some(text) if !text.is_empty() => text,
            _ => {
                let text = self.clipboard.read_text(tab).await;
                if text.is_empty() {
                    debug!(tab = %tab, "Clipboard is empty or unreadable");
                }
                text
            }
        }
    }

    async fn load_pacing(&self) -> PacingSettings {
        match self.settings.get().await.and_then(|s| s.pacing()) {
            Ok(pacing) => pacing,
            Err(e) => {
                warn!("Using default typing speed: {}", e);
                PacingSettings::default()
            }
        }
    }

    /// Drop this task's registry entry and release its session, unless a
    /// stop (or a newer task) already took the entry.
    async fn finish(&self, tab: &TabId, token: TaskToken) {
        if let Some(removed) = self.registry.remove_if_current(tab, token) {
            if let Some(session) = removed.session {
                self.release(&session).await;
            }
        }
    }

    async fn release(&self, session: &DebugSession) {
        if let Err(e) = self.driver.detach(session).await {
            warn!(tab = %session.tab(), "{}", e);
        }
    }
}

#[async_trait]
impl TypingControl for TypingEngine {
    fn start_typing(&self, tab: TabId, text: Option<String>) -> Option<JoinHandle<TypingOutcome>> {
        let Some(token) = self.registry.try_register(&tab) else {
            info!(tab = %tab, "Typing is already in progress for this tab");
            return None;
        };

        let engine = self.clone();
        Some(tokio::spawn(async move { engine.run_task(tab, token, text).await }))
    }

    async fn stop_typing(&self, tab: &TabId) -> bool {
        let Some(removed) = self.registry.remove(tab) else {
            return false;
        };
        debug!(tab = %tab, token = removed.token, "Stop requested");
        if let Some(session) = removed.session {
            self.release(&session).await;
        }
        true
    }

    async fn force_paste(&self, tab: &TabId, text: Option<String>) -> PasteOutcome {
        let text = self.resolve_text(tab, text).await;
        if text.is_empty() {
            return PasteOutcome::NothingToPaste;
        }

        let session = match self.driver.attach(tab).await {
            Ok(session) => session,
            Err(e) => {
                warn!(tab = %tab, "Force paste failed: {}", e);
                return PasteOutcome::AttachFailed(e.to_string());
            }
        };

        let result = self.driver.insert_text(&session, &text).await;
        self.release(&session).await;

        match result {
            Ok(()) => {
                let chars = text.chars().count();
                info!(tab = %tab, chars, "Pasted text");
                PasteOutcome::Pasted { chars }
            }
            Err(e) => {
                warn!(tab = %tab, "Force paste failed: {}", e);
                PasteOutcome::InjectionFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

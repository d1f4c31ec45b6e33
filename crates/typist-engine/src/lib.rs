//! # Typist Engine
//!
//! Simulates human typing into a browser tab. A typing task attaches a
//! debugging session to the tab, injects the text one character at a time
//! with a words-per-minute base delay plus random jitter, and always releases
//! the session when it ends.
//!
//! Cancellation is cooperative: every task holds a token, and before each
//! character it checks that the [`TaskRegistry`] still maps its tab to that
//! token. [`TypingEngine::stop_typing`] removes the entry; a newer task for the
//! same tab replaces it.
//!
//! The engine talks to the outside world through three seams so it can run
//! against a real browser or against test doubles:
//!
//! - [`DebugSessionDriver`]: attach / insert text / detach ([`CdpDriver`]).
//! - [`ClipboardReader`]: clipboard text of a tab ([`CdpClipboard`]).
//! - [`SettingsStore`]: pacing settings and snippets ([`FileSettingsStore`],
//!   [`MemorySettingsStore`]).

mod clipboard;
mod driver;
mod engine;
mod error;
mod pacing;
mod registry;
mod settings;
mod store;

pub use clipboard::{CdpClipboard, ClipboardReader};
pub use driver::{CdpDriver, DebugSession, DebugSessionDriver, TabId};
pub use engine::{PasteOutcome, TypingControl, TypingEngine, TypingOutcome};
pub use error::EngineError;
pub use pacing::PacingSettings;
pub use registry::{RemovedTask, TaskRegistry, TaskToken};
pub use settings::{SettingsPatch, SettingsStore, Snippet, StoredSettings};
pub use store::{FileSettingsStore, MemorySettingsStore};

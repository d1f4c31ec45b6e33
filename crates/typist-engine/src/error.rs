//! Engine error types.

use thiserror::Error;

/// Errors raised inside the typing engine and its collaborators.
///
/// None of these escape a typing task: they end the task, get logged, and
/// surface only through [`TypingOutcome`](crate::TypingOutcome) /
/// [`PasteOutcome`](crate::PasteOutcome).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The debugging session could not be established.
    #[error("Debugger attach failed for tab {tab}: {message}")]
    AttachFailure { tab: String, message: String },

    /// A character or bulk insertion was rejected.
    #[error("Text injection failed: {0}")]
    InjectionFailure(String),

    /// Reading the page clipboard failed.
    #[error("Clipboard read failed: {0}")]
    ClipboardFailure(String),

    /// Releasing a debugging session failed.
    #[error("Debugger detach failed: {0}")]
    DetachFailure(String),

    /// Settings could not be read, written or validated.
    #[error("Settings error: {0}")]
    Settings(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Settings(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Settings(format!("Invalid settings file: {}", e))
    }
}

//! Dispatch error types.

use thiserror::Error;
use typist_engine::EngineError;

/// Errors reported back to whoever issued a menu click, shortcut or message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Unknown menu id, shortcut name or snippet index.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The command needs a tab and none was given or found.
    #[error("No tab provided")]
    NoTab,

    /// A `type` message without both a tab and some text.
    #[error("No tab or text provided")]
    NoTabOrText,

    /// A message command nobody handles.
    #[error("Unknown command")]
    UnknownCommand(String),

    /// The settings store failed.
    #[error(transparent)]
    Settings(#[from] EngineError),

    /// The engine tried and failed.
    #[error("{0}")]
    Failed(String),
}

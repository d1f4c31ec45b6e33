//! Menu item ids and the actions they name.

use std::fmt;
use std::str::FromStr;

use crate::error::DispatchError;

const START_TYPING: &str = "start-typing";
const STOP_TYPING: &str = "stop-typing";
const FORCE_PASTE: &str = "force-paste";
const PASTE_SNIPPET_PREFIX: &str = "paste-snippet-";
const TYPE_SNIPPET_PREFIX: &str = "type-snippet-";

/// What a clickable menu item does.
///
/// Snippet actions carry the snippet's position in the stored list; the
/// index is only checked against the list when the click is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    StartTyping,
    StopTyping,
    ForcePaste,
    PasteSnippet(usize),
    TypeSnippet(usize),
}

impl MenuAction {
    pub fn parse(id: &str) -> Result<Self, DispatchError> {
        match id {
            START_TYPING => return Ok(Self::StartTyping),
            STOP_TYPING => return Ok(Self::StopTyping),
            FORCE_PASTE => return Ok(Self::ForcePaste),
            _ => {}
        }

        if let Some(index) = id.strip_prefix(PASTE_SNIPPET_PREFIX) {
            return parse_index(id, index).map(Self::PasteSnippet);
        }
        if let Some(index) = id.strip_prefix(TYPE_SNIPPET_PREFIX) {
            return parse_index(id, index).map(Self::TypeSnippet);
        }

        Err(DispatchError::InvalidReference(id.to_string()))
    }

    /// The menu item id for this action.
    pub fn id(&self) -> String {
        match self {
            Self::StartTyping => START_TYPING.to_string(),
            Self::StopTyping => STOP_TYPING.to_string(),
            Self::ForcePaste => FORCE_PASTE.to_string(),
            Self::PasteSnippet(i) => format!("{}{}", PASTE_SNIPPET_PREFIX, i),
            Self::TypeSnippet(i) => format!("{}{}", TYPE_SNIPPET_PREFIX, i),
        }
    }
}

/// Parse the index part of a snippet id. Submenu headers
/// (`paste-snippet-parent`) land here too and are rejected.
fn parse_index(id: &str, index: &str) -> Result<usize, DispatchError> {
    index
        .parse()
        .map_err(|_| DispatchError::InvalidReference(id.to_string()))
}

impl FromStr for MenuAction {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

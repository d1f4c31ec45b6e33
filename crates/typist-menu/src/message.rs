//! JSON message contract: one request per line in, one response per line out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use typist_engine::TabId;

use crate::error::DispatchError;

/// An incoming message.
///
/// Only `command` is required; which other fields matter depends on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Echoed back on the response so callers can match replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Value>,

    pub command: String,

    /// Tab the request is about, if not the sender's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<TabId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Menu item id for `menu-click`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Shortcut name for `shortcut`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_tab(mut self, tab: impl Into<TabId>) -> Self {
        self.tab = Some(tab.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Whether the command acts on a tab, so the host should find one when
    /// the request names none.
    pub fn wants_tab(&self) -> bool {
        matches!(
            self.command.as_str(),
            "type" | "menu-click" | "shortcut" | "stop" | "paste"
        )
    }
}

/// Reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Value>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            request_id: None,
            success: true,
            error: None,
            data: None,
        }
    }

    pub fn ok_with(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            request_id: None,
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<Value>) -> Self {
        self.request_id = request_id;
        self
    }
}

impl From<Result<(), DispatchError>> for Response {
    fn from(result: Result<(), DispatchError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

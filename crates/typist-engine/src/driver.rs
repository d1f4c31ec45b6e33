//! Debug session driver: attach, insert text, detach.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use typist_cdp::{CdpClient, CdpError};

use crate::error::EngineError;

/// Opaque identifier of a browser tab (a CDP target id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TabId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A debugging session attached to one tab.
///
/// Owned by the operation that attached it, which must hand it back to
/// [`DebugSessionDriver::detach`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSession {
    tab: TabId,
    session_id: String,
}

impl DebugSession {
    pub fn new(tab: TabId, session_id: impl Into<String>) -> Self {
        Self {
            tab,
            session_id: session_id.into(),
        }
    }

    pub fn tab(&self) -> &TabId {
        &self.tab
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Capability to instrument a tab and inject text into it.
#[async_trait]
pub trait DebugSessionDriver: Send + Sync {
    /// Establish a debugging session on the tab.
    async fn attach(&self, tab: &TabId) -> Result<DebugSession, EngineError>;

    /// Insert literal text at the tab's current input focus.
    async fn insert_text(&self, session: &DebugSession, text: &str) -> Result<(), EngineError>;

    /// Release the session.
    async fn detach(&self, session: &DebugSession) -> Result<(), EngineError>;
}

/// [`DebugSessionDriver`] backed by a CDP browser connection.
pub struct CdpDriver {
    client: Arc<CdpClient>,
}

impl CdpDriver {
    pub fn new(client: Arc<CdpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DebugSessionDriver for CdpDriver {
    async fn attach(&self, tab: &TabId) -> Result<DebugSession, EngineError> {
        let session_id = self
            .client
            .attach_to_target(tab.as_str())
            .await
            .map_err(|e| EngineError::AttachFailure {
                tab: tab.to_string(),
                message: e.to_string(),
            })?;
        Ok(DebugSession::new(tab.clone(), session_id))
    }

    async fn insert_text(&self, session: &DebugSession, text: &str) -> Result<(), EngineError> {
        self.client
            .insert_text(session.session_id(), text)
            .await
            .map_err(|e| EngineError::InjectionFailure(e.to_string()))
    }

    async fn detach(&self, session: &DebugSession) -> Result<(), EngineError> {
        match self.client.detach_from_target(session.session_id()).await {
            Ok(()) => Ok(()),
            // The browser already dropped the session.
            Err(CdpError::SessionClosed) => {
                debug!(tab = %session.tab(), "Connection closed before detach");
                Ok(())
            }
            Err(e) => Err(EngineError::DetachFailure(e.to_string())),
        }
    }
}

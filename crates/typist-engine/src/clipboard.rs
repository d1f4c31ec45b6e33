//! Clipboard access in a tab's page context.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use typist_cdp::CdpClient;

use crate::driver::TabId;
use crate::error::EngineError;

const READ_CLIPBOARD: &str = "navigator.clipboard.readText()";

/// Reads the clipboard as seen by a tab's page.
#[async_trait]
pub trait ClipboardReader: Send + Sync {
    /// Current clipboard text, or an empty string when it cannot be read.
    async fn read_text(&self, tab: &TabId) -> String;
}

/// [`ClipboardReader`] that evaluates `navigator.clipboard.readText()` in the
/// page through a short-lived CDP session.
pub struct CdpClipboard {
    client: Arc<CdpClient>,
}

impl CdpClipboard {
    pub fn new(client: Arc<CdpClient>) -> Self {
        Self { client }
    }

    async fn try_read(&self, tab: &TabId) -> Result<String, EngineError> {
        let session_id = self
            .client
            .attach_to_target(tab.as_str())
            .await
            .map_err(|e| EngineError::ClipboardFailure(e.to_string()))?;

        let value = self.client.evaluate(&session_id, READ_CLIPBOARD, true).await;

        if let Err(e) = self.client.detach_from_target(&session_id).await {
            warn!(tab = %tab, "Failed to detach clipboard session: {}", e);
        }

        let value = value.map_err(|e| EngineError::ClipboardFailure(e.to_string()))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl ClipboardReader for CdpClipboard {
    async fn read_text(&self, tab: &TabId) -> String {
        match self.try_read(tab).await {
            Ok(text) => {
                debug!(tab = %tab, chars = text.chars().count(), "Read clipboard");
                text
            }
            Err(e) => {
                warn!(tab = %tab, "{}", e);
                String::new()
            }
        }
    }
}

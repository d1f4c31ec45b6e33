//! Turns menu clicks, shortcuts and messages into typing engine calls.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, info, warn};
use typist_engine::{PasteOutcome, SettingsStore, Snippet, TabId, TypingControl};

use crate::action::MenuAction;
use crate::error::DispatchError;
use crate::message::{Request, Response};
use crate::model::{build_menu, MenuItem};

/// The one keyboard shortcut: start typing the clipboard into the active tab.
pub const START_TYPING_SHORTCUT: &str = "start_typing";

/// Command dispatcher.
///
/// Snippet actions are index-addressed; the snippet list is re-read from the
/// store on every click so a stale menu can never reach past its end.
pub struct Dispatcher {
    engine: Arc<dyn TypingControl>,
    settings: Arc<dyn SettingsStore>,
    menu: Mutex<Vec<MenuItem>>,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn TypingControl>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            engine,
            settings,
            menu: Mutex::new(build_menu(&[])),
        }
    }

    /// The menu as last built.
    pub fn menu(&self) -> Vec<MenuItem> {
        self.menu.lock().clone()
    }

    /// Rebuild the menu from the stored snippets.
    pub async fn update_menu(&self) -> Result<Vec<MenuItem>, DispatchError> {
        let settings = self.settings.get().await?;
        let items = build_menu(&settings.snippets);
        debug!(items = items.len(), "Menu rebuilt");
        *self.menu.lock() = items.clone();
        Ok(items)
    }

    /// Handle a click on the menu item `id` inside `tab`.
    pub async fn on_menu_click(&self, id: &str, tab: &TabId) -> Result<(), DispatchError> {
        let action = MenuAction::parse(id).inspect_err(|_| {
            warn!(id, "Ignoring click on unknown menu item");
        })?;
        debug!(tab = %tab, action = %action, "Menu click");

        match action {
            MenuAction::StartTyping => {
                self.engine.start_typing(tab.clone(), None);
                Ok(())
            }
            MenuAction::StopTyping => {
                self.engine.stop_typing(tab).await;
                Ok(())
            }
            MenuAction::ForcePaste => self.paste(tab, None).await.map(|_| ()),
            MenuAction::PasteSnippet(index) => {
                let snippet = self.snippet(index).await?;
                self.paste(tab, Some(snippet.content)).await.map(|_| ())
            }
            MenuAction::TypeSnippet(index) => {
                let snippet = self.snippet(index).await?;
                self.engine.start_typing(tab.clone(), Some(snippet.content));
                Ok(())
            }
        }
    }

    /// Handle a keyboard shortcut. Without an active tab this does nothing.
    pub async fn on_shortcut(
        &self,
        name: &str,
        active_tab: Option<TabId>,
    ) -> Result<(), DispatchError> {
        if name != START_TYPING_SHORTCUT {
            return Err(DispatchError::InvalidReference(name.to_string()));
        }
        match active_tab {
            Some(tab) => {
                self.engine.start_typing(tab, None);
            }
            None => info!("No active tab for shortcut {}", name),
        }
        Ok(())
    }

    /// Handle a message. `sender_tab` is used when the request names no tab.
    pub async fn on_message(&self, request: Request, sender_tab: Option<TabId>) -> Response {
        let request_id = request.request_id.clone();
        let tab = request.tab.clone().or(sender_tab);
        debug!(command = %request.command, tab = ?tab, "Message received");

        let response = match request.command.as_str() {
            "update-menu" => self.update_menu().await.map(|_| ()).into(),
            "type" => self.handle_type(tab, request.text).into(),
            "menu-click" => match (request.id, tab) {
                (Some(id), Some(tab)) => self.on_menu_click(&id, &tab).await.into(),
                (None, _) => Err(DispatchError::InvalidReference("missing menu id".to_string())).into(),
                (_, None) => Err(DispatchError::NoTab).into(),
            },
            "shortcut" => {
                let name = request.name.unwrap_or_default();
                self.on_shortcut(&name, tab).await.into()
            }
            "stop" => match tab {
                Some(tab) => {
                    let stopped = self.engine.stop_typing(&tab).await;
                    Response::ok_with(json!({ "stopped": stopped }))
                }
                None => Err(DispatchError::NoTab).into(),
            },
            "paste" => match tab {
                Some(tab) => match self.paste(&tab, request.text).await {
                    Ok(chars) => Response::ok_with(json!({ "chars": chars })),
                    Err(e) => Response::failure(e.to_string()),
                },
                None => Err(DispatchError::NoTab).into(),
            },
            "menu" => match serde_json::to_value(self.menu()) {
                Ok(items) => Response::ok_with(items),
                Err(e) => Response::failure(e.to_string()),
            },
            other => {
                warn!(command = other, "Unknown command");
                Err(DispatchError::UnknownCommand(other.to_string())).into()
            }
        };

        response.with_request_id(request_id)
    }

    fn handle_type(&self, tab: Option<TabId>, text: Option<String>) -> Result<(), DispatchError> {
        match (tab, text.filter(|t| !t.is_empty())) {
            (Some(tab), Some(text)) => {
                self.engine.start_typing(tab, Some(text));
                Ok(())
            }
            _ => Err(DispatchError::NoTabOrText),
        }
    }

    /// Force-paste and report how many characters went in.
    async fn paste(&self, tab: &TabId, text: Option<String>) -> Result<usize, DispatchError> {
        match self.engine.force_paste(tab, text).await {
            PasteOutcome::Pasted { chars } => Ok(chars),
            PasteOutcome::NothingToPaste => Ok(0),
            PasteOutcome::AttachFailed(e) | PasteOutcome::InjectionFailed(e) => {
                Err(DispatchError::Failed(e))
            }
        }
    }

    async fn snippet(&self, index: usize) -> Result<Snippet, DispatchError> {
        let settings = self.settings.get().await?;
        settings
            .snippets
            .get(index)
            .filter(|snippet| snippet.is_usable())
            .cloned()
            .ok_or_else(|| {
                warn!(index, count = settings.snippets.len(), "Invalid snippet at index");
                DispatchError::InvalidReference(format!("no snippet at index {}", index))
            })
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

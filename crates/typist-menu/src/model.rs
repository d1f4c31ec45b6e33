//! Menu model built from the snippet library.

use serde::{Deserialize, Serialize};
use tracing::warn;
use typist_engine::Snippet;

use crate::action::MenuAction;

/// The only context menu items appear in: editable fields.
pub const EDITABLE_CONTEXT: &str = "editable";

const PASTE_SNIPPET_PARENT: &str = "paste-snippet-parent";
const TYPE_SNIPPET_PARENT: &str = "type-snippet-parent";

const MAX_TITLE_CHARS: usize = 35;
const TRUNCATED_TITLE_CHARS: usize = 32;

/// One entry of the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub contexts: Vec<String>,
}

impl MenuItem {
    fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_id: None,
            contexts: vec![EDITABLE_CONTEXT.to_string()],
        }
    }

    fn child_of(mut self, parent: &str) -> Self {
        self.parent_id = Some(parent.to_string());
        self
    }

    /// Whether clicking this item does something (submenu headers don't).
    pub fn is_action(&self) -> bool {
        MenuAction::parse(&self.id).is_ok()
    }
}

/// Shorten a snippet name for display: names over 35 characters become
/// their first 32 characters followed by `...`.
pub fn truncate_title(name: &str) -> String {
    if name.chars().count() > MAX_TITLE_CHARS {
        let head: String = name.chars().take(TRUNCATED_TITLE_CHARS).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// Build the full menu: the three static actions, then (if there are any
/// snippets) a paste submenu and a type submenu.
///
/// Child ids use the snippet's position in `snippets`, so skipped entries
/// leave gaps rather than shifting later indices.
pub fn build_menu(snippets: &[Snippet]) -> Vec<MenuItem> {
    let mut items = vec![
        MenuItem::new(MenuAction::StartTyping.id(), "Start Typing"),
        MenuItem::new(MenuAction::StopTyping.id(), "Stop Typing"),
        MenuItem::new(MenuAction::ForcePaste.id(), "Force Paste"),
    ];

    if snippets.is_empty() {
        return items;
    }

    let titled: Vec<(usize, String)> = snippets
        .iter()
        .enumerate()
        .filter_map(|(index, snippet)| {
            if !snippet.is_usable() {
                warn!(index, "Skipping snippet without a name or content");
                None
            } else {
                Some((index, truncate_title(&snippet.name)))
            }
        })
        .collect();

    items.push(MenuItem::new(PASTE_SNIPPET_PARENT, "Paste from Snippets"));
    items.extend(titled.iter().map(|(index, title)| {
        MenuItem::new(MenuAction::PasteSnippet(*index).id(), title.as_str())
            .child_of(PASTE_SNIPPET_PARENT)
    }));

    items.push(MenuItem::new(TYPE_SNIPPET_PARENT, "Type Snippet"));
    items.extend(titled.iter().map(|(index, title)| {
        MenuItem::new(MenuAction::TypeSnippet(*index).id(), title.as_str())
            .child_of(TYPE_SNIPPET_PARENT)
    }));

    items
}

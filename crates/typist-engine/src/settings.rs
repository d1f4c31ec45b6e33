//! Stored settings: typing pace and the snippet library.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::EngineError;
use crate::pacing::PacingSettings;

/// A named piece of text that can be typed or pasted on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub name: String,
    pub content: String,
}

impl Snippet {
    /// Build a snippet from user input, trimming both fields.
    pub fn new(name: &str, content: &str) -> Result<Self, EngineError> {
        let name = name.trim();
        let content = content.trim();
        if name.is_empty() || content.is_empty() {
            return Err(EngineError::Settings(
                "snippet name and content are required".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            content: content.to_string(),
        })
    }

    /// Stand-in for a stored entry that could not be read. Keeps the
    /// positions of the entries after it.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            content: String::new(),
        }
    }

    /// Whether the snippet can be offered in the menu and typed.
    pub fn is_usable(&self) -> bool {
        !self.name.trim().is_empty() && !self.content.is_empty()
    }
}

/// Everything the settings store persists.
///
/// Field names match the keys the browser extension stored, so an exported
/// extension settings object can be dropped in as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    /// Base typing speed in words per minute.
    #[serde(default = "default_typing_speed", deserialize_with = "typing_speed_or_default")]
    pub typing_speed: u32,

    /// Minimum extra delay per character, in milliseconds.
    #[serde(default = "default_min_delay", deserialize_with = "min_delay_or_default")]
    pub min_typing_speed: u64,

    /// Maximum extra delay per character, in milliseconds.
    #[serde(default = "default_max_delay", deserialize_with = "max_delay_or_default")]
    pub max_typing_speed: u64,

    /// Unreadable entries are kept as [`Snippet::blank`] so menu ids stay
    /// aligned with the stored list.
    #[serde(default, deserialize_with = "lenient_snippets")]
    pub snippets: Vec<Snippet>,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            typing_speed: default_typing_speed(),
            min_typing_speed: default_min_delay(),
            max_typing_speed: default_max_delay(),
            snippets: Vec::new(),
        }
    }
}

fn default_typing_speed() -> u32 {
    PacingSettings::DEFAULT_WPM
}

fn default_min_delay() -> u64 {
    PacingSettings::DEFAULT_MIN_JITTER_MS
}

fn default_max_delay() -> u64 {
    PacingSettings::DEFAULT_MAX_JITTER_MS
}

/// Read a single value, treating `null` or a wrong type as absent.
fn lenient<'de, D, T>(deserializer: D, key: &str) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!(key, "Ignoring invalid setting: {}", e);
            Ok(None)
        }
    }
}

fn typing_speed_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient(deserializer, "typingSpeed")?.unwrap_or_else(default_typing_speed))
}

fn min_delay_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient(deserializer, "minTypingSpeed")?.unwrap_or_else(default_min_delay))
}

fn max_delay_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient(deserializer, "maxTypingSpeed")?.unwrap_or_else(default_max_delay))
}

fn lenient_snippets<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Snippet>, D::Error> {
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        other => {
            warn!("Ignoring snippets that are not a list: {}", other);
            return Ok(Vec::new());
        }
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match serde_json::from_value::<Snippet>(entry) {
            Ok(snippet) => snippet,
            Err(e) => {
                warn!(index, "Invalid snippet at index {}: {}", index, e);
                Snippet::blank()
            }
        })
        .collect())
}

impl StoredSettings {
    /// Validated pacing parameters.
    pub fn pacing(&self) -> Result<PacingSettings, EngineError> {
        PacingSettings::new(
            self.typing_speed,
            self.min_typing_speed,
            self.max_typing_speed,
        )
    }

    /// Apply a partial update, rejecting results with invalid pacing.
    pub fn apply(&self, patch: SettingsPatch) -> Result<Self, EngineError> {
        let mut next = self.clone();
        if let Some(wpm) = patch.typing_speed {
            next.typing_speed = wpm;
        }
        if let Some(min) = patch.min_typing_speed {
            next.min_typing_speed = min;
        }
        if let Some(max) = patch.max_typing_speed {
            next.max_typing_speed = max;
        }
        if let Some(snippets) = patch.snippets {
            next.snippets = snippets;
        }
        next.pacing()?;
        Ok(next)
    }
}

/// Partial update for [`SettingsStore::set`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing_speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_typing_speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_typing_speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippets: Option<Vec<Snippet>>,
}

impl SettingsPatch {
    /// Patch that replaces the snippet list.
    pub fn snippets(snippets: Vec<Snippet>) -> Self {
        Self {
            snippets: Some(snippets),
            ..Self::default()
        }
    }

    /// Patch that restores the default pace and keeps the snippets.
    pub fn reset_pacing() -> Self {
        let defaults = StoredSettings::default();
        Self {
            typing_speed: Some(defaults.typing_speed),
            min_typing_speed: Some(defaults.min_typing_speed),
            max_typing_speed: Some(defaults.max_typing_speed),
            snippets: None,
        }
    }
}

/// Durable key-value settings storage.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored values, with defaults for anything never written.
    async fn get(&self) -> Result<StoredSettings, EngineError>;

    /// Merge a partial update into the stored values.
    async fn set(&self, patch: SettingsPatch) -> Result<(), EngineError>;
}

//! [`SettingsStore`] implementations.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::EngineError;
use crate::settings::{SettingsPatch, SettingsStore, StoredSettings};

/// Settings persisted as a JSON file.
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// crash mid-write leaves the previous settings intact.
pub struct FileSettingsStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles.
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StoredSettings, EngineError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(StoredSettings::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoredSettings::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, settings: &StoredSettings) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self) -> Result<StoredSettings, EngineError> {
        self.read().await
    }

    async fn set(&self, patch: SettingsPatch) -> Result<(), EngineError> {
        let _guard = self.write_lock.lock().await;
        let next = self.read().await?.apply(patch)?;
        self.write(&next).await
    }
}

/// Settings kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<StoredSettings>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the given values without validating them.
    pub fn with_settings(settings: StoredSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self) -> Result<StoredSettings, EngineError> {
        Ok(self.settings.lock().clone())
    }

    async fn set(&self, patch: SettingsPatch) -> Result<(), EngineError> {
        let mut settings = self.settings.lock();
        let next = settings.apply(patch)?;
        *settings = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Snippet;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.get().await.unwrap(), StoredSettings::default());
    }

    #[tokio::test]
    async fn test_file_store_persists_patches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = FileSettingsStore::new(&path);

        store
            .set(SettingsPatch {
                typing_speed: Some(75),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        store
            .set(SettingsPatch::snippets(vec![Snippet::new("Hi", "Hello!").unwrap()]))
            .await
            .unwrap();

        let reopened = FileSettingsStore::new(&path);
        let settings = reopened.get().await.unwrap();
        assert_eq!(settings.typing_speed, 75);
        assert_eq!(settings.snippets.len(), 1);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"typingSpeed\": 75"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_rejects_invalid_patch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::new(&path);

        let result = store
            .set(SettingsPatch {
                min_typing_speed: Some(300),
                max_typing_speed: Some(100),
                ..SettingsPatch::default()
            })
            .await;
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(matches!(store.get().await, Err(EngineError::Settings(_))));
    }

    #[tokio::test]
    async fn test_file_store_tolerates_bad_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"typingSpeed":null,"snippets":[{"name":"Greeting","content":"Hi"},{"content":"orphan"},{"name":"Sig","content":"Best"}]}"#,
        )
        .unwrap();

        let store = FileSettingsStore::new(&path);
        let settings = store.get().await.unwrap();
        assert_eq!(settings.typing_speed, 120);
        assert_eq!(settings.snippets.len(), 3);
        assert_eq!(settings.snippets[0].content, "Hi");
        assert!(!settings.snippets[1].is_usable());
        assert_eq!(settings.snippets[2].content, "Best");

        store
            .set(SettingsPatch {
                max_typing_speed: Some(250),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        let settings = store.get().await.unwrap();
        assert_eq!(settings.max_typing_speed, 250);
        assert_eq!(settings.snippets[2].name, "Sig");
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySettingsStore::new();
        store
            .set(SettingsPatch {
                max_typing_speed: Some(400),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        assert_eq!(store.get().await.unwrap().max_typing_speed, 400);
    }
}

//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::loader::ConfigLoader;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Browser (CDP endpoint) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// HTTP debugging endpoint, e.g. `http://localhost:9222`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Upper bound for a single CDP command round trip.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Protocol version the host expects the browser to speak.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            command_timeout_secs: default_command_timeout(),
            protocol_version: default_protocol_version(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_command_timeout() -> u64 {
    30
}

fn default_protocol_version() -> String {
    "1.3".to_string()
}

/// Settings storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON settings file. Defaults to `~/.typist/settings.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<String>,
}

impl StorageConfig {
    /// Resolve the settings file path, expanding `~`.
    pub fn settings_path(&self) -> PathBuf {
        match &self.settings_path {
            Some(p) => PathBuf::from(ConfigLoader::expand_path(p)),
            None => typist_dir().join("settings.json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files. Defaults to `~/.typist/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Whether to write log files at all.
    #[serde(default = "default_true")]
    pub file: bool,

    /// Log file format: `text` or `json`.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
            file: true,
            format: default_format(),
        }
    }
}

impl LoggingConfig {
    /// Resolve the log directory, expanding `~`.
    pub fn log_dir(&self) -> PathBuf {
        match &self.dir {
            Some(d) => PathBuf::from(ConfigLoader::expand_path(d)),
            None => typist_dir().join("logs"),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

/// Base directory for typist state (`~/.typist`).
pub fn typist_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".typist"))
        .unwrap_or_else(|| PathBuf::from(".typist"))
}

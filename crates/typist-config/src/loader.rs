//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file, falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand `${VAR}` references to environment variables.
    ///
    /// Full-line `#` comments are left untouched, so they may mention
    /// variables that are not set. Values are substituted once and are not
    /// themselves expanded.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut expanded = String::with_capacity(content.len());

        for line in content.split_inclusive('\n') {
            if line.trim_start().starts_with('#') {
                expanded.push_str(line);
                continue;
            }

            let mut copied = 0;
            for cap in re.captures_iter(line) {
                let (Some(reference), Some(name)) = (cap.get(0), cap.get(1)) else {
                    continue;
                };
                let value = std::env::var(name.as_str())
                    .map_err(|_| ConfigError::EnvVarNotSet(name.as_str().to_string()))?;
                expanded.push_str(&line[copied..reference.start()]);
                expanded.push_str(&value);
                copied = reference.end();
            }
            expanded.push_str(&line[copied..]);
        }

        Ok(expanded)
    }

    /// Expand shell-style paths (e.g., `~/.typist`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

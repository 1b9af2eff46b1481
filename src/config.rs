//! User settings loaded from `config.json`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{APP_DIR, CONFIG_ENV_VAR, CONFIG_FILE, DEFAULT_TIMEOUT_SECS};
use crate::error::ConfigError;
use crate::storage::JsonStorage;

/// Settings with every field optional on disk
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Appended as `"Name: Value"` to calls created from the command line
    pub default_headers: BTreeMap<String, String>,
    pub timeout_secs: Option<u64>,
    /// Where collections and logs live
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    /// Load from the first config file that exists. No file means defaults.
    pub fn load() -> Result<Settings, ConfigError> {
        match search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Settings::from_file(&path),
            None => Ok(Settings::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(JsonStorage::default_dir)
    }

    /// Default headers as `"Name: Value"` entries
    pub fn header_lines(&self) -> Vec<String> {
        self.default_headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect()
    }
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
        paths.push(PathBuf::from(explicit));
    }
    if let Some(config) = dirs::config_dir() {
        paths.push(config.join(APP_DIR).join(CONFIG_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}", APP_DIR)).join(CONFIG_FILE));
    }
    paths.push(PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert!(settings.header_lines().is_empty());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"default_headers":{"User-Agent":"restman","Accept":"*/*"},"timeout_secs":5}"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert_eq!(
            settings.header_lines(),
            vec!["Accept: */*".to_string(), "User-Agent: restman".to_string()]
        );
        assert!(settings.data_dir.is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "default_headers: nope").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::Json { .. })
        ));
    }
}

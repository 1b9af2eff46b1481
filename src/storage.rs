//! Persistence of the working set as a single JSON document

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::constants::{APP_DIR, COLLECTIONS_FILE};
use crate::error::StorageError;
use crate::models::Collection;

/// Loads and saves the full collection set
pub trait Repository {
    /// Read every collection. A missing store yields an empty set.
    fn load(&self) -> Result<Vec<Collection>, StorageError>;

    /// Overwrite the store with `collections`
    fn save(&self, collections: &[Collection]) -> Result<(), StorageError>;
}

/// Stores collections in one JSON file (`collections.json`)
#[derive(Clone, Debug)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStorage { path: path.into() }
    }

    /// `collections.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        JsonStorage::new(dir.as_ref().join(COLLECTIONS_FILE))
    }

    /// `<config dir>/restman`, or `./restman` when no config dir exists
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

impl Repository for JsonStorage {
    fn load(&self) -> Result<Vec<Collection>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No collections file yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let collections: Option<Vec<Collection>> =
            serde_json::from_str(&content).map_err(|source| StorageError::Json {
                path: self.path.clone(),
                source,
            })?;
        let collections = collections.unwrap_or_default();

        tracing::info!(
            path = %self.path.display(),
            count = collections.len(),
            "Loaded collections"
        );
        Ok(collections)
    }

    fn save(&self, collections: &[Collection]) -> Result<(), StorageError> {
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(collections)?;
        fs::write(&self.path, content).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            path = %self.path.display(),
            count = collections.len(),
            "Saved collections"
        );
        Ok(())
    }
}

//! Key-value persistence for the client session
//!
//! Mirrors browser local storage: string keys, string values, no expiry.

use crate::{PortalError, PortalResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key under which the session token is kept
pub const TOKEN_KEY: &str = "token";
/// Key under which the role claim is kept
pub const ROLE_KEY: &str = "role";

/// String key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> PortalResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> PortalResult<()>;
    /// Removing an absent key is not an error
    fn remove(&mut self, key: &str) -> PortalResult<()>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> PortalResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PortalResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PortalResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk
///
/// The whole file is rewritten on every change, through a temporary file and a
/// rename, so a crash never leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> PortalResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PortalResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let json_data = std::fs::read_to_string(&self.path)?;
        if json_data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&json_data)?)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> PortalResult<()> {
        let json_data = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        std::fs::write(&tmp_path, json_data)?;
        std::fs::rename(&tmp_path, &self.path)?;

        debug!("Saved {} portal entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> PortalResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> PortalResult<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> PortalResult<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        storage.remove(TOKEN_KEY).unwrap();
        storage.remove(TOKEN_KEY).unwrap();
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("portal.json");

        let mut storage = FileStorage::new(&path).unwrap();
        storage.set(TOKEN_KEY, "abc").unwrap();
        storage.set(ROLE_KEY, "buyer").unwrap();

        let mut reopened = FileStorage::new(&path).unwrap();
        assert_eq!(reopened.get(ROLE_KEY).unwrap().as_deref(), Some("buyer"));

        reopened.remove(TOKEN_KEY).unwrap();
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path).unwrap();
        assert!(matches!(
            storage.get(TOKEN_KEY),
            Err(PortalError::Serialization(_))
        ));
    }
}

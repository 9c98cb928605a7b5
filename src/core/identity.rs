//! Persisted identity
//!
//! A single opaque user id stored under a well-known key. Set on profile
//! creation, read to decide "has profile" vs "needs profile", removed on
//! logout.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::{fs, io};

use log::{debug, info};

use crate::types::Error;
use crate::CURRENT_USER_KEY;

/// Errors from a key-value store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("corrupt store at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Storage(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// String key-value persistence
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten whole on every change
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> StoreResult<BTreeMap<String, String>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_str(&json).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|e| self.io_err(e))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.read()?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.read()?;
        if entries.remove(key).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}

/// Identity helpers over any store
pub struct Identity<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> Identity<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Stored user id, if any. Blank values count as absent.
    pub fn current_user(&self) -> StoreResult<Option<String>> {
        Ok(self
            .store
            .get(CURRENT_USER_KEY)?
            .filter(|id| !id.trim().is_empty()))
    }

    pub fn has_profile(&self) -> StoreResult<bool> {
        Ok(self.current_user()?.is_some())
    }

    pub fn remember(&self, user_id: &str) -> StoreResult<()> {
        self.store.set(CURRENT_USER_KEY, user_id)?;
        debug!("identity stored: {}", user_id);
        Ok(())
    }

    /// Logout
    pub fn forget(&self) -> StoreResult<()> {
        self.store.remove(CURRENT_USER_KEY)?;
        info!("identity cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_memory_identity_lifecycle() {
        let store = MemoryStore::new();
        let identity = Identity::new(&store);
        assert!(!identity.has_profile().unwrap());

        identity.remember("user-7").unwrap();
        assert_eq!(identity.current_user().unwrap().as_deref(), Some("user-7"));

        identity.forget().unwrap();
        assert_eq!(identity.current_user().unwrap(), None);
    }

    #[test]
    fn test_blank_id_is_no_profile() {
        let store = MemoryStore::new();
        store.set(CURRENT_USER_KEY, "  ").unwrap();
        assert!(!Identity::new(&store).has_profile().unwrap());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("identity.json");

        Identity::new(&FileStore::new(&path)).remember("user-3").unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(
            Identity::new(&reopened).current_user().unwrap().as_deref(),
            Some("user-3")
        );

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"currentUserId\""));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("absent.json"));
        assert_eq!(store.get("anything").unwrap(), None);
        store.remove("anything").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("identity.json");
        fs::write(&path, "not json").unwrap();
        let err = FileStore::new(&path).get(CURRENT_USER_KEY).unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}

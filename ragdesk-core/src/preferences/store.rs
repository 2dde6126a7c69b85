//! Durable key-value stores backing user preferences.

use crate::lock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored preferences are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// A string-keyed, string-valued durable store.
///
/// Implementations may fail for any reason (missing permissions, full disk,
/// corrupt file). Callers that must not fail wrap the store in
/// [`Preferences`](super::Preferences).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store. Values vanish when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock::read(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock::write(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk.
///
/// Every `get` re-reads the file and every `set` rewrites it through a temp
/// file and a rename, so concurrent processes see each other's changes.
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

    fn load(&self) -> Result<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let store = FileStore::new(&path);

        assert!(store.get("ragdesk.model").unwrap().is_none());
        store.set("ragdesk.model", "llama3.2:1b").unwrap();
        store.set("ragdesk.rag_top_k", "5").unwrap();

        assert!(path.exists());
        assert_eq!(store.get("ragdesk.model").unwrap().as_deref(), Some("llama3.2:1b"));
        assert_eq!(store.get("ragdesk.rag_top_k").unwrap().as_deref(), Some("5"));
    }

    #[test]
    fn test_file_store_sees_external_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let first = FileStore::new(&path);
        let second = FileStore::new(&path);

        first.set("k", "1").unwrap();
        assert_eq!(second.get("k").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_file_store_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get("k"), Err(StorageError::Json(_))));
        assert!(store.set("k", "v").is_err());
    }
}

//! Storage backends for the cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::CacheError;

/// Synchronous key-value storage of JSON values.
///
/// Writes are complete when the call returns: a reader that runs right
/// after `set` sees the new value, in memory and on disk.
pub trait KvBackend: Send + Sync {
    /// Get a value, `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store a value.
    fn set(&self, key: &str, value: Value) -> Result<(), CacheError>;

    /// Remove a value. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }

    /// Get all keys, sorted.
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CacheError> {
    mutex
        .lock()
        .map_err(|_| CacheError::StoreError("store lock poisoned".to_string()))
}

/// Backend that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        lock(&self.entries)?.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}

/// Backend persisted as one JSON object in a file.
///
/// The whole file is rewritten through a temporary sibling and a rename on
/// every change, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileBackend {
    /// Open a file-backed store, creating parent directories as needed.
    /// A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::OpenError(format!("{}: {}", parent.display(), e)))?;
        }

        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| CacheError::OpenError(format!("{}: {}", path.display(), e)))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| CacheError::OpenError(format!("{}: {}", path.display(), e)))?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), CacheError> {
        let content = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.persist(&entries) {
            // Keep memory equal to disk.
            match previous {
                Some(v) => entries.insert(key.to_string(), v),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        if let Some(previous) = entries.remove(key) {
            if let Err(e) = self.persist(&entries) {
                entries.insert(key.to_string(), previous);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        backend.set("b", json!(2)).unwrap();
        backend.set("a", json!(1)).unwrap();

        assert_eq!(backend.get("a").unwrap(), Some(json!(1)));
        assert!(backend.exists("b").unwrap());
        assert_eq!(backend.keys().unwrap(), vec!["a", "b"]);

        backend.delete("a").unwrap();
        backend.delete("missing").unwrap();
        assert_eq!(backend.get("a").unwrap(), None);
    }

    #[test]
    fn test_file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("craft.json");

        let backend = FileBackend::open(&path).unwrap();
        backend.set("cart:lines", json!([{ "quantity": 2 }])).unwrap();
        backend.set("cart:promocode", json!("SAVE10")).unwrap();
        backend.delete("cart:promocode").unwrap();
        drop(backend);

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(
            reopened.get("cart:lines").unwrap(),
            Some(json!([{ "quantity": 2 }]))
        );
        assert!(!reopened.exists("cart:promocode").unwrap());
    }

    #[test]
    fn test_file_backend_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("craft.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(FileBackend::open(&path), Err(CacheError::OpenError(_))));
    }

    #[test]
    fn test_file_backend_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("craft.json");
        fs::write(&path, "").unwrap();

        let backend = FileBackend::open(&path).unwrap();
        assert!(backend.keys().unwrap().is_empty());
    }
}

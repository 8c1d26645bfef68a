//! JSON file option store.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{OptionStore, StoreError};

/// [`OptionStore`] persisting every option in one JSON object on disk.
///
/// The document is loaded once on [`open`](Self::open) and kept in memory.
/// Each mutation writes a complete new document to a temporary file in the
/// same directory and renames it over the old one; the in-memory copy is only
/// updated after the rename succeeds, so a failed write leaves both the file
/// and the cache at the previous state.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    options: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is treated as an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, and
    /// [`StoreError::Serialization`] if it is not a JSON object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let options = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Map::new()
        };

        tracing::debug!(path = %path.display(), options = options.len(), "Opened option store");

        Ok(Self {
            path,
            options: RwLock::new(options),
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate(&self, apply: impl FnOnce(&mut Map<String, Value>)) -> Result<(), StoreError> {
        let mut guard = self.options.write();
        let mut next = guard.clone();
        apply(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, options: &Map<String, Value>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let bytes = serde_json::to_vec_pretty(options)?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        Ok(())
    }
}

impl OptionStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.options.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.mutate(|options| {
            options.insert(key.to_string(), value);
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        if !self.options.read().contains_key(key) {
            return Ok(());
        }
        self.mutate(|options| {
            options.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("options.json")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("aspireupdate_settings", json!({"api_host": "api.aspirecloud.org"})).unwrap();
        store.set("aspireupdate-reset", json!("true")).unwrap();
        store.delete("aspireupdate-reset").unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("aspireupdate_settings").unwrap(),
            Some(json!({"api_host": "api.aspirecloud.org"}))
        );
        assert_eq!(reopened.get("aspireupdate-reset").unwrap(), None);
    }

    #[test]
    fn test_rejects_non_object_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_empty_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, "  \n").unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("options.json");
        let store = JsonFileStore::open(&path).unwrap();

        let result = store.set("k", json!(1));
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(store.get("k").unwrap(), None);
    }
}

//! In-memory option store.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

use super::{OptionStore, StoreError};

/// Process-local [`OptionStore`] backed by a `HashMap`.
///
/// # Example
///
/// ```
/// use aspireupdate_core::{InMemoryStore, OptionStore};
/// use serde_json::json;
///
/// let store = InMemoryStore::new();
/// store.set("aspireupdate-reset", json!("true")).unwrap();
/// assert_eq!(store.get("aspireupdate-reset").unwrap(), Some(json!("true")));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    options: RwLock<HashMap<String, Value>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `options`.
    #[must_use]
    pub fn with_options<I, K>(options: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            options: RwLock::new(options.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Returns the number of stored options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.read().is_empty()
    }
}

impl OptionStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.options.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.options.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.options.write().remove(key);
        Ok(())
    }
}

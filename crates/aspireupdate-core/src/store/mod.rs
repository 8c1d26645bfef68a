//! The option store contract.
//!
//! The host application owns persistence. The settings core only needs a
//! key/value service with whole-value `get`/`set`/`delete` and read-your-writes
//! consistency within a request. Values are JSON documents so the stored shape
//! of a record can differ from the shape the resolver hands out.
//!
//! Two adapters ship with the crate:
//!
//! - [`InMemoryStore`] - process-local map, for tests and embedding hosts
//! - [`JsonFileStore`] - a single JSON document on disk
//!
//! Concurrent read-modify-write sequences across requests are not
//! transactional: two admins saving at once race and the last write wins.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by an [`OptionStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a backend error from a message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(anyhow::anyhow!(message.into()))
    }
}

/// Key/value persistence for named options.
///
/// Writes replace the whole value under a key; there is no partial update.
pub trait OptionStore: Send + Sync {
    /// Reads the value under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the value under `key`.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: OptionStore + ?Sized> OptionStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

impl<T: OptionStore + ?Sized> OptionStore for &T {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

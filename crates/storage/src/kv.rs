//! Key-value store trait and error model.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage-level error. Domain failures live in `partsbin-core`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("payload for key `{key}` is not valid JSON: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Synchronous string key-value persistence.
///
/// Writes happen immediately after each mutating operation, not batched; a
/// crash between mutation and write loses only that one operation's effect.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Read and deserialize a JSON payload.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw).map_err(|source| StorageError::Serde {
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Serialize and write a JSON payload.
    fn put_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Serde {
            key: key.to_string(),
            source,
        })?;
        self.put(key, &raw)
    }
}

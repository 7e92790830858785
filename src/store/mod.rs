//! Durable key-value storage for wizard state.
//!
//! Values are JSON text stored under string keys. Reads never fail: a missing
//! key, an unreadable file, or a malformed payload all come back as `None` so
//! callers can fall back to defaults.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while writing to a store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid store key '{0}'")]
    InvalidKey(String),

    #[error("failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A string-keyed store of JSON blobs
///
/// Implementations only deal with raw text. Typed access goes through the
/// provided `save`/`load`/`clear` methods.
pub trait KeyValueStore {
    /// Store raw text under `key`, replacing any previous value
    fn put(&mut self, key: &str, text: &str) -> Result<(), StoreError>;

    /// Fetch raw text for `key`, `None` if absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Serialize `value` to JSON and store it under `key`
    fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.put(key, &text)?;
        tracing::debug!(key, bytes = text.len(), "saved store entry");
        Ok(())
    }

    /// Load and deserialize the value under `key`
    ///
    /// Malformed payloads are logged and treated as absent.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = self.get(key)?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding malformed store entry");
                None
            }
        }
    }

    /// Remove every key in `keys`
    fn clear(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.remove(key)?;
        }
        tracing::debug!(count = keys.len(), "cleared store entries");
        Ok(())
    }

    /// Check whether a value is stored under `key`
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Keys are used as file names, so keep them to a safe alphabet
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Draft {
        name: String,
        count: u32,
        tags: Vec<String>,
        note: Option<String>,
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("stepOneData").is_ok());
        assert!(validate_key("user_tickets-2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("a b").is_err());
    }

    #[test]
    fn test_save_then_load_struct() {
        let mut store = MemoryStore::new();
        let draft = Draft {
            name: "Ada".to_string(),
            count: 3,
            tags: vec!["vip".to_string()],
            note: None,
        };

        store.save("draft", &draft).unwrap();
        let loaded: Draft = store.load("draft").unwrap();
        assert_eq!(loaded, draft);
    }

    #[test]
    fn test_save_then_load_arbitrary_json() {
        let mut store = MemoryStore::new();
        let value = json!({
            "nested": {"list": [1, 2.5, "three", null, true]},
            "empty": {},
            "unicode": "Ikoyi, Lagos ✓"
        });

        store.save("blob", &value).unwrap();
        let loaded: serde_json::Value = store.load("blob").unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_load_truncated_json_is_none() {
        let mut store = MemoryStore::new();
        store.put("draft", r#"{"name": "Ada", "cou"#).unwrap();

        let loaded: Option<Draft> = store.load("draft");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_wrong_shape_is_none() {
        let mut store = MemoryStore::new();
        store.put("draft", r#"[1, 2, 3]"#).unwrap();

        let loaded: Option<Draft> = store.load("draft");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_missing_is_none() {
        let store = MemoryStore::new();
        let loaded: Option<Draft> = store.load("nothing");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_clear_removes_only_named_keys() {
        let mut store = MemoryStore::new();
        store.save("a", &1).unwrap();
        store.save("b", &2).unwrap();
        store.save("c", &3).unwrap();

        store.clear(&["a", "b", "missing"]).unwrap();

        assert!(!store.contains("a"));
        assert!(!store.contains("b"));
        assert!(store.contains("c"));
    }
}

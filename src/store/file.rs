//! File-backed store: one `<key>.json` file per entry

use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{validate_key, KeyValueStore, StoreError};

/// Stores each key as a JSON file inside a single directory
///
/// Writes go to a synced temp file that is renamed into place, then the
/// directory is synced, so a crash mid-write leaves either the old or the new
/// value on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Make a rename durable. Windows cannot open directories for syncing.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl KeyValueStore for JsonFileStore {
    fn put(&mut self, key: &str, text: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        fs::create_dir_all(&self.root)?;

        let path = self.entry_path(key);
        let tmp = self.root.join(format!(".{key}.json.tmp"));
        if let Err(err) = write_synced(&tmp, text.as_bytes()).and_then(|()| fs::rename(&tmp, &path))
        {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(key, error = %cleanup, "failed to remove temp file");
                }
            }
            return Err(err.into());
        }
        sync_dir(&self.root)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        if validate_key(key).is_err() {
            return None;
        }

        match fs::read_to_string(self.entry_path(key)) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read store entry");
                None
            }
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("state");
        let mut store = JsonFileStore::new(&root);

        store.save("stepOneData", &serde_json::json!({"a": 1})).unwrap();

        assert!(root.join("stepOneData.json").exists());
        assert!(!root.join(".stepOneData.json.tmp").exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = JsonFileStore::new(temp_dir.path());
            store.save("wizardProgress", &vec![1, 2, 3]).unwrap();
        }

        let store = JsonFileStore::new(temp_dir.path());
        let loaded: Vec<u32> = store.load("wizardProgress").unwrap();
        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupted_file_loads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("ticketData.json"), "{\"ticketCode\": \"TK").unwrap();

        let store = JsonFileStore::new(temp_dir.path());
        let loaded: Option<serde_json::Value> = store.load("ticketData");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path());
        assert!(store.remove("stepTwoData").is_ok());
    }

    #[test]
    fn test_invalid_key_rejected_on_write() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path());

        let err = store.put("../outside", "{}").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
        assert!(store.get("../outside").is_none());
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path());

        store.save("stepTwoData", &"first").unwrap();
        store.save("stepTwoData", &"second").unwrap();

        let loaded: String = store.load("stepTwoData").unwrap();
        assert_eq!(loaded, "second");
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path());
        // A directory in the way makes the rename fail
        let blocker = temp_dir.path().join("ticketData.json");
        fs::create_dir_all(blocker.join("inner")).unwrap();

        let err = store.put("ticketData", "{}").unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert!(!temp_dir.path().join(".ticketData.json.tmp").exists());
        assert!(blocker.is_dir());
    }
}

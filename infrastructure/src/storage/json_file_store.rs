//! JSON file backed key-value store.
//!
//! All keys live in one JSON object. Every `set` / `remove` rewrites the
//! whole file through a sibling temp file and a rename, so a crash never
//! leaves a half-written state file behind. The in-memory view only
//! changes once the write has landed.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use verinox_application::{KeyValueStore, StorageError};

/// [`KeyValueStore`] persisted as a single JSON object file.
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileKeyValueStore {
    /// Open the store at `path`, creating parent directories.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// moved aside to `<path>.corrupt` and the store starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(values) => {
                    debug!("Loaded {} keys from {}", values.len(), path.display());
                    values
                }
                Err(e) => {
                    let backup = Self::corrupt_path(&path);
                    warn!(
                        "State file {} is corrupt ({}); moving it to {}",
                        path.display(),
                        e,
                        backup.display()
                    );
                    fs::rename(&path, &backup)?;
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string_pretty(values).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(raw.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.lock();
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.write_all(&next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.lock();
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.write_all(&next)?;
        *values = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("themeColor").unwrap(), None);
        store.set("themeColor", "light_mode").unwrap();
        store.set("all-chats", "{\"conversations\":[]}").unwrap();
        drop(store);

        let reopened = JsonFileKeyValueStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("themeColor").unwrap(),
            Some("light_mode".to_string())
        );
        assert_eq!(
            reopened.get("all-chats").unwrap(),
            Some("{\"conversations\":[]}".to_string())
        );
    }

    #[test]
    fn test_remove_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileKeyValueStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("never-set").unwrap();

        let reopened = JsonFileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap(), None);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileKeyValueStore::open(&path).unwrap();
        store.set("k", "v").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["state.json".to_string()]);
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json at all").unwrap();

        let store = JsonFileKeyValueStore::open(&path).unwrap();

        assert_eq!(store.get("anything").unwrap(), None);
        assert!(dir.path().join("state.json.corrupt").exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_write_leaves_values_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileKeyValueStore::open(&path).unwrap();
        store.set("themeColor", "dark_mode").unwrap();

        // A directory where the temp file should go makes every write fail
        fs::create_dir(store.temp_path()).unwrap();

        assert!(store.set("themeColor", "light_mode").is_err());
        assert!(store.remove("themeColor").is_err());
        assert_eq!(
            store.get("themeColor").unwrap().as_deref(),
            Some("dark_mode")
        );
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("dark_mode"));
    }
}

//! A small string key-value store that plays the role browser local storage plays for the web
//! client: one key per concern, each value a JSON document.

use crate::error::{ErrorType, IntoResult, Res};
use crate::Result;
use anyhow::{bail, Context};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Key for the JSON-encoded transaction collection.
pub const TRANSACTIONS_KEY: &str = "fuelTransactions";

/// Key for the JSON-encoded signed-in identity.
pub const USER_KEY: &str = "googleUser";

/// Key for the RFC 3339 stamp of the last cloud sync.
pub const LAST_SYNC_KEY: &str = "lastSyncTime";

/// Persistent string storage.
///
/// A failed `set` or `remove` leaves the previously stored value in place.
pub trait KeyValueStore: Debug + Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Stores all keys in a single JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file is an empty store and is not created until the
    /// first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path).pub_result(ErrorType::Store)?;
        trace!("Opened {} with {} keys", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Creates an empty store file at `path` if none exists.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::open(path)?;
        if !store.path.is_file() {
            write_entries(&store.path, &store.entries).pub_result(ErrorType::Store)?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `entries` and only adopts them once they are on disk.
    fn commit(&mut self, entries: BTreeMap<String, String>) -> Result<()> {
        write_entries(&self.path, &entries).pub_result(ErrorType::Store)?;
        self.entries = entries;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value);
        self.commit(entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut entries = self.entries.clone();
        entries.remove(key);
        self.commit(entries)
    }
}

fn read_entries(path: &Path) -> Res<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Unable to read the storage file {}", path.display()))?;
    if data.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&data)
        .with_context(|| format!("The storage file {} is not a JSON object", path.display()))
}

/// Writes to a temp file next to `path` and renames it into place.
fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Res<()> {
    let data = serde_json::to_string_pretty(entries).context("Unable to serialize storage")?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, data)
        .with_context(|| format!("Unable to write {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        bail!("Unable to replace {}: {e}", path.display());
    }
    Ok(())
}

/// An in-memory store. `failing()` builds one whose writes always fail.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            entries: HashMap::new(),
            fail_writes: true,
        }
    }

    pub fn with_entry(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes {
            return Err(crate::Error::msg(
                ErrorType::Store,
                format!("Write of '{key}' rejected"),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.check_writable(key)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("storage.json")).unwrap();
        assert_eq!(store.get(TRANSACTIONS_KEY), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = FileStore::create(&path).unwrap();
        assert!(path.is_file());
        store.set(USER_KEY, r#"{"id":"u"}"#.to_string()).unwrap();
        store.set(LAST_SYNC_KEY, "2024-03-15T08:00:00Z".to_string()).unwrap();
        store.remove(LAST_SYNC_KEY).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(USER_KEY).as_deref(), Some(r#"{"id":"u"}"#));
        assert_eq!(reopened.get(LAST_SYNC_KEY), None);
        assert!(!dir.path().join("storage.json.tmp").exists());
    }

    #[test]
    fn test_file_store_failed_write_keeps_previous_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = FileStore::create(&path).unwrap();
        store.set(TRANSACTIONS_KEY, "[]".to_string()).unwrap();

        // A directory where the temp file should go makes the write fail.
        std::fs::create_dir(dir.path().join("storage.json.tmp")).unwrap();
        let err = store
            .set(TRANSACTIONS_KEY, "[1]".to_string())
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Store);
        assert_eq!(store.get(TRANSACTIONS_KEY).as_deref(), Some("[]"));
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(TRANSACTIONS_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let err = FileStore::open(&path).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Store);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new().with_entry(USER_KEY, "x");
        assert_eq!(store.get(USER_KEY).as_deref(), Some("x"));
        store.remove(USER_KEY).unwrap();
        assert_eq!(store.get(USER_KEY), None);

        let mut failing = MemoryStore::failing();
        assert!(failing.set(USER_KEY, "y".to_string()).is_err());
        assert_eq!(failing.get(USER_KEY), None);
    }
}

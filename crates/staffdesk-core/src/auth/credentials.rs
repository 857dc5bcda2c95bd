use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::error::StoreError;

/// Keychain service name for [`KeyringStore`]
const SERVICE_NAME: &str = "staffdesk";

/// Credential file name in the data directory
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Persistent key-value storage for credentials.
///
/// Reads never fail: a backend that cannot read reports the key as absent
/// and logs why, so callers deciding on access fail closed.
pub trait CredentialStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing a key that is not present is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => {
                warn!(key, "Credential store lock poisoned");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

// ============================================================================
// JSON file
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    pub written_at: DateTime<Utc>,
}

impl StoredEntry {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            written_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.written_at).num_minutes()
    }
}

/// Credential map persisted as a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/credentials.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, StoredEntry>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write to a temp file beside the target, then rename it into place, so
    /// an interrupted write never leaves a truncated credential file.
    fn save(&self, entries: &BTreeMap<String, StoredEntry>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn entry(&self, key: &str) -> Option<StoredEntry> {
        match self.load() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credential file");
                None
            }
        }
    }

    pub fn written_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entry(key).map(|e| e.written_at)
    }

    /// Human-readable age of an entry, or "never" when absent.
    pub fn age_display(&self, key: &str) -> String {
        self.entry(key)
            .map(|e| format_age(e.age_minutes()))
            .unwrap_or_else(|| "never".to_string())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entry(key).map(|e| e.value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), StoredEntry::new(value));
        self.save(&entries)?;
        debug!(key, path = %self.path.display(), "Stored credential");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
            debug!(key, path = %self.path.display(), "Removed credential");
        }
        Ok(())
    }
}

/// Format an age in minutes as "just now", "12m ago", "3h ago" or "2d ago".
pub fn format_age(minutes: i64) -> String {
    if minutes < 1 {
        // Clock skew lands here too
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Credentials kept in the OS keychain, one entry per key.
#[derive(Debug, Default)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> Option<String> {
        let result = Entry::new(SERVICE_NAME, key).and_then(|entry| entry.get_password());
        match result {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read credential from keychain");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = Entry::new(SERVICE_NAME, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let entry = Entry::new(SERVICE_NAME, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("authToken"), None);

        store.set("authToken", "xc1:abc").unwrap();
        assert_eq!(store.get("authToken").as_deref(), Some("xc1:abc"));

        store.remove("authToken").unwrap();
        assert_eq!(store.get("authToken"), None);
        // Removing again is fine
        store.remove("authToken").unwrap();
    }

    #[test]
    fn test_memory_store_poisoned_lock_reads_as_absent() {
        let store = MemoryStore::new();
        store.set("authToken", "xc1:abc").unwrap();

        let _ = std::panic::catch_unwind(|| {
            let _held = store.entries.lock().unwrap();
            panic!("poison the lock");
        });

        assert!(store.entries.is_poisoned());
        assert_eq!(store.get("authToken"), None);
        assert!(matches!(store.set("authToken", "x"), Err(StoreError::Poisoned)));
        assert!(matches!(store.remove("authToken"), Err(StoreError::Poisoned)));
    }

    #[test]
    fn test_file_store_write_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::in_dir(tmp.path());
        store.set("authToken", "first").unwrap();
        store.set("authToken", "second").unwrap();
        store.set("other", "b").unwrap();
        store.remove("other").unwrap();

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![CREDENTIALS_FILE.to_string()]);
        assert_eq!(store.get("authToken").as_deref(), Some("second"));
    }

    // Needs a real OS keychain (macOS Keychain, Windows Credential Manager,
    // Linux kernel keyutils). Run with `cargo test -- --ignored`.
    #[test]
    #[ignore = "requires an OS keychain"]
    fn test_keyring_store_persists_across_instances() {
        let key = "staffdeskTestRoundTrip";
        KeyringStore::new().set(key, "xc1:abc").unwrap();

        let reopened = KeyringStore::new();
        assert_eq!(reopened.get(key).as_deref(), Some("xc1:abc"));

        reopened.remove(key).unwrap();
        assert_eq!(KeyringStore::new().get(key), None);
    }

    #[test]
    #[ignore = "requires an OS keychain"]
    fn test_keyring_store_remove_twice() {
        let key = "staffdeskTestRemoveTwice";
        let store = KeyringStore::new();
        store.set(key, "xc1:abc").unwrap();

        store.remove(key).unwrap();
        store.remove(key).unwrap();
        assert_eq!(store.get(key), None);
    }

    #[test]
    fn test_keyring_store_missing_key_is_absent() {
        let store = KeyringStore::new();
        assert_eq!(store.get("staffdeskTestNeverWritten"), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let tmp = TempDir::new().unwrap();
        FileStore::in_dir(tmp.path()).set("authToken", "xc1:abc").unwrap();

        let reopened = FileStore::in_dir(tmp.path());
        assert_eq!(reopened.get("authToken").as_deref(), Some("xc1:abc"));
        assert!(reopened.written_at("authToken").is_some());
        assert_eq!(reopened.age_display("authToken"), "just now");
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("nested").join(CREDENTIALS_FILE));
        assert_eq!(store.get("authToken"), None);
        assert_eq!(store.age_display("authToken"), "never");
        store.remove("authToken").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_absent() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::in_dir(tmp.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.get("authToken"), None);
        assert!(matches!(store.set("authToken", "x"), Err(StoreError::Format(_))));
    }

    #[test]
    fn test_file_store_remove_keeps_other_keys() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::in_dir(tmp.path());
        store.set("authToken", "a").unwrap();
        store.set("other", "b").unwrap();

        store.remove("authToken").unwrap();
        assert_eq!(store.get("authToken"), None);
        assert_eq!(store.get("other").as_deref(), Some("b"));
    }

    #[test]
    fn test_boxed_store_delegates() {
        let store: Box<dyn CredentialStore> = Box::new(MemoryStore::new());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_entry_age_minutes() {
        let mut entry = StoredEntry::new("x");
        assert!(entry.age_minutes() <= 1);
        entry.written_at = Utc::now() - Duration::minutes(90);
        assert_eq!(entry.age_minutes(), 90);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(-5), "just now");
        assert_eq!(format_age(0), "just now");
        assert_eq!(format_age(5), "5m ago");
        assert_eq!(format_age(89), "1h ago");
        assert_eq!(format_age(90), "2h ago");
        assert_eq!(format_age(1440 + 11 * 60), "1d ago");
        assert_eq!(format_age(1440 + 12 * 60), "2d ago");
    }
}

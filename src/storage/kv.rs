//! Key-value persistence capability
//!
//! Flat string records addressed by a key. The identifier store and the
//! holdings book sit on top of this trait, so tests substitute
//! [`MemoryStore`] while the binaries use [`FileStore`].

use crate::storage::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Synchronous key-value store
///
/// `set` must be atomic: after an error the previous value (if any) is
/// still the one returned by `get`.
pub trait KeyValueStore: Send + Sync {
    /// Read the record stored under `key`, `None` if absent
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the record stored under `key`
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// In-process store
///
/// Reads and writes can be switched off to simulate an unavailable or
/// full backing store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a record (bypasses the write failure switch)
    pub fn with_record(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut records) = self.records.lock() {
            records.insert(key.into(), value.into());
        }
        self
    }

    /// Make every subsequent `get` fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        let records = self
            .records
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        let mut records = self
            .records
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key under a data directory
///
/// Writes go to `<key>.json.tmp` and are renamed over `<key>.json`, so a
/// failed write never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    pub fn open(data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Root directory of the store
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get path of the record file for `key`
    pub fn record_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.data_dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.record_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.record_path(key)?;
        let tmp = path.with_extension("json.tmp");

        if let Err(e) = std::fs::write(&tmp, value) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(key = %key, bytes = value.len(), "Persisted record");
        Ok(())
    }
}

/// Keys become file names, so only `[A-Za-z0-9_-]` is accepted
fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

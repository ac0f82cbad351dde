//! File-backed key-value persistence
//!
//! All keys live in one JSON object file. Every write rewrites the whole file
//! atomically (write to temp file, then rename), so a crash mid-write leaves
//! the previous state intact.
//!
//! Storage location: `~/.local/share/quotebook/local_storage.json`
//! (configurable via `Config`)

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{KeyValueStore, StorageError, StorageResult};

/// Durable key-value store
///
/// Keeps an in-memory copy of the file; the copy is only replaced after the
/// file write succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file doesn't exist
    ///
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content =
                fs::read_to_string(&path).map_err(|source| StorageError::Read {
                    path: path.clone(),
                    source,
                })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
                    path: path.clone(),
                    details: e.to_string(),
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened key-value store {:?} ({} keys)", path, entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the backing file exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(entries).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            details: e.to_string(),
        })?;
        atomic_write(&self.path, &json)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, updates: &[(&str, &str)]) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let mut next = entries.clone();
        for (key, value) in updates {
            next.insert((*key).to_string(), (*value).to_string());
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::on_write(e, parent))?;
    }

    // Temp file in the same directory keeps the rename atomic
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path).map_err(|e| StorageError::on_write(e, &temp_path))?;
    file.write_all(data)
        .and_then(|_| file.sync_all())
        .map_err(|e| StorageError::on_write(e, &temp_path))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::Replace {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

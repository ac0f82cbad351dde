//! In-memory key-value store
//!
//! Backs session-scoped state and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyValueStore, StorageError, StorageResult};

/// Process-lifetime store
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current entry count
    pub fn len(&self) -> usize {
        self.data.lock().map(|data| data.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        let mut data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        for (key, value) in entries {
            data.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        data.remove(key);
        Ok(())
    }
}

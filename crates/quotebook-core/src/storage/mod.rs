//! Storage layer
//!
//! Key-value persistence with string values, mirroring the two scopes a
//! quote catalog needs:
//!
//! - **Durable**: [`FileStore`], a single JSON file rewritten atomically
//! - **Session**: [`MemoryStore`], gone when the process exits
//!
//! Writes spanning several keys go through [`KeyValueStore::set_many`] so
//! readers observe either the previous or the complete new state.

pub mod error;
pub mod memory;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use persistence::FileStore;

/// Durable key holding the quote collection as a JSON array
pub const QUOTES_KEY: &str = "quotes";
/// Durable key holding the RFC 3339 time of the last collection save
pub const LAST_MODIFIED_KEY: &str = "lastModified";
/// Durable key holding the last selected category filter
pub const LAST_SELECTED_CATEGORY_KEY: &str = "lastSelectedCategory";
/// Session key holding the last displayed quote
pub const LAST_VIEWED_QUOTE_KEY: &str = "lastViewedQuote";
/// Session key mirroring the active category filter
pub const CURRENT_CATEGORY_KEY: &str = "currentCategory";

/// A string key-value store
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write several values in one atomic step
    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()>;

    /// Remove a value (missing keys are ignored)
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Write a single value
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.set_many(&[(key, value)])
    }
}

//! Quote storage
//!
//! The `QuoteStore` owns the in-memory collection and keeps it in step with
//! durable key-value storage:
//! - `quotes`: the collection as a JSON array
//! - `lastModified`: when the collection was last saved
//!
//! Both keys are written together in one atomic step. Every mutation path
//! (add, import, sync merge) goes through this type so persistence and the
//! category index never drift from the in-memory collection.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = QuoteStore::load(storage)?;  // Seeds defaults on first run
//!
//! store.add(Quote::validated("Carpe diem.", "Latin")?)?;
//! let wisdom = store.by_category(&CategoryFilter::parse("Wisdom"));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::categories::CategoryIndex;
use crate::error::{Error, Result};
use crate::models::{default_quotes, CategoryFilter, Quote};
use crate::storage::{KeyValueStore, LAST_MODIFIED_KEY, QUOTES_KEY};

/// Durable key where an unreadable collection is moved before reseeding
const CORRUPT_QUOTES_KEY: &str = "quotes.corrupt";

/// Quote store shared between the catalog and the sync engine
pub type SharedQuoteStore = Arc<Mutex<QuoteStore>>;

/// In-memory quote collection backed by durable storage
pub struct QuoteStore {
    quotes: Vec<Quote>,
    index: CategoryIndex,
    last_modified: Option<DateTime<Utc>>,
    storage: Arc<dyn KeyValueStore>,
}

impl QuoteStore {
    /// Load the collection, seeding the defaults if none is stored
    ///
    /// On first run the default quotes are persisted immediately. A stored
    /// collection that can't be parsed is moved to `quotes.corrupt` and
    /// replaced by the defaults. Only storage backend failures are errors.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let stored = storage.get(QUOTES_KEY)?;
        let last_modified = storage
            .get(LAST_MODIFIED_KEY)?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|time| time.with_timezone(&Utc));

        let parsed = match stored {
            Some(raw) => match serde_json::from_str::<Vec<Quote>>(&raw) {
                Ok(quotes) => Some(quotes),
                Err(e) => {
                    warn!(
                        "Stored quotes are unreadable ({}), backing up to '{}' and reseeding",
                        e, CORRUPT_QUOTES_KEY
                    );
                    storage.set(CORRUPT_QUOTES_KEY, &raw)?;
                    None
                }
            },
            None => None,
        };

        let seeded = parsed.is_none();
        let mut store = match parsed {
            Some(quotes) => {
                debug!("Quotes loaded from storage: {}", quotes.len());
                Self {
                    index: CategoryIndex::from_quotes(&quotes),
                    quotes,
                    last_modified,
                    storage,
                }
            }
            None => {
                let quotes = default_quotes();
                Self {
                    index: CategoryIndex::from_quotes(&quotes),
                    quotes,
                    last_modified: None,
                    storage,
                }
            }
        };

        if seeded {
            store.save()?;
            info!("Default quotes loaded");
        }

        Ok(store)
    }

    /// Persist the full collection and the current time in one write
    pub fn save(&mut self) -> Result<()> {
        let now = Utc::now();
        let json = serde_json::to_string(&self.quotes)?;
        let stamp = now.to_rfc3339();

        self.storage
            .set_many(&[(QUOTES_KEY, json.as_str()), (LAST_MODIFIED_KEY, stamp.as_str())])?;
        self.last_modified = Some(now);

        debug!("Quotes saved to storage: {}", self.quotes.len());
        Ok(())
    }

    /// Append a quote and persist
    ///
    /// Both fields are trimmed; blank text or category is rejected with
    /// [`Error::Validation`] and nothing is stored.
    pub fn add(&mut self, quote: Quote) -> Result<()> {
        let text = quote.text.trim().to_string();
        let category = quote.category.trim().to_string();
        if text.is_empty() || category.is_empty() {
            return Err(Error::Validation(
                "Please enter both a quote and a category".to_string(),
            ));
        }

        let quote = Quote {
            text,
            category,
            ..quote
        };

        let previous_len = self.quotes.len();
        self.quotes.push(quote);
        self.commit(previous_len)
    }

    /// Append every quote and persist (used by import)
    ///
    /// Returns the number of quotes appended.
    pub fn extend(&mut self, quotes: Vec<Quote>) -> Result<usize> {
        let count = quotes.len();
        if count == 0 {
            return Ok(0);
        }
        let previous_len = self.quotes.len();
        self.quotes.extend(quotes);
        self.commit(previous_len)?;
        Ok(count)
    }

    /// Append the quotes whose text is not already present (used by sync)
    ///
    /// Persists only when something was appended, so an empty merge leaves
    /// `lastModified` untouched. Returns the number of quotes appended.
    pub fn merge_unique(&mut self, quotes: Vec<Quote>) -> Result<usize> {
        let mut seen: HashSet<String> = self.quotes.iter().map(|q| q.text.clone()).collect();
        let fresh: Vec<Quote> = quotes
            .into_iter()
            .filter(|q| seen.insert(q.text.clone()))
            .collect();

        let count = fresh.len();
        if count == 0 {
            return Ok(0);
        }
        let previous_len = self.quotes.len();
        self.quotes.extend(fresh);
        self.commit(previous_len)?;
        Ok(count)
    }

    /// Every quote, in insertion order
    pub fn all(&self) -> &[Quote] {
        &self.quotes
    }

    /// Quotes passing a filter; `all` returns everything
    pub fn by_category(&self, filter: &CategoryFilter) -> Vec<&Quote> {
        self.quotes.iter().filter(|q| filter.matches(q)).collect()
    }

    /// Categories derived from the current collection
    pub fn categories(&self) -> &CategoryIndex {
        &self.index
    }

    /// When the collection was last saved
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Wrap the store for sharing with the sync engine
    pub fn into_shared(self) -> SharedQuoteStore {
        Arc::new(Mutex::new(self))
    }

    /// Persist and rebuild the index; on failure the collection is truncated
    /// back to `previous_len` so memory matches what storage still holds
    fn commit(&mut self, previous_len: usize) -> Result<()> {
        if let Err(e) = self.save() {
            self.quotes.truncate(previous_len);
            return Err(e);
        }
        self.index = CategoryIndex::from_quotes(&self.quotes);
        Ok(())
    }
}

//! View state that outlives a single action
//!
//! - The category filter is written to durable storage
//!   (`lastSelectedCategory`) and mirrored in session storage
//!   (`currentCategory`). On restore the durable value wins.
//! - The last displayed quote lives in session storage only.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::categories::CategoryIndex;
use crate::error::Result;
use crate::models::{CategoryFilter, LastViewedQuote, Quote};
use crate::storage::{
    KeyValueStore, CURRENT_CATEGORY_KEY, LAST_SELECTED_CATEGORY_KEY, LAST_VIEWED_QUOTE_KEY,
};

/// Filter and last-viewed persistence across both storage scopes
pub struct ViewState {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl ViewState {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// Restore the filter, falling back to `all`
    ///
    /// Durable value first, then the session mirror. A value naming a
    /// category that is no longer present restores as `all`.
    pub fn restore_filter(&self, index: &CategoryIndex) -> Result<CategoryFilter> {
        let stored = match self.durable.get(LAST_SELECTED_CATEGORY_KEY)? {
            Some(value) => Some(value),
            None => self.session.get(CURRENT_CATEGORY_KEY)?,
        };

        let filter = match stored {
            Some(value) if index.is_valid_selection(&value) => CategoryFilter::parse(&value),
            Some(value) => {
                debug!("Restored filter '{}' no longer matches a category", value);
                CategoryFilter::All
            }
            None => CategoryFilter::All,
        };

        Ok(filter)
    }

    /// Persist the filter in both scopes
    pub fn save_filter(&self, filter: &CategoryFilter) -> Result<()> {
        self.durable
            .set(LAST_SELECTED_CATEGORY_KEY, filter.as_str())?;
        self.session.set(CURRENT_CATEGORY_KEY, filter.as_str())?;
        Ok(())
    }

    /// Remember a quote as the last one displayed in this session
    pub fn record_last_viewed(&self, quote: &Quote) -> Result<LastViewedQuote> {
        let viewed = LastViewedQuote::new(quote, Utc::now());
        let json = serde_json::to_string(&viewed)?;
        self.session.set(LAST_VIEWED_QUOTE_KEY, &json)?;
        Ok(viewed)
    }

    /// The last quote displayed in this session, if any
    ///
    /// An unreadable entry is treated as absent.
    pub fn last_viewed(&self) -> Result<Option<LastViewedQuote>> {
        let viewed = self
            .session
            .get(LAST_VIEWED_QUOTE_KEY)?
            .and_then(|raw| serde_json::from_str(&raw).ok());
        Ok(viewed)
    }
}

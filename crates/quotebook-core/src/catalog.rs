//! Quote catalog
//!
//! The catalog is the main entry point for front ends. It owns the active
//! category filter and the view state, and shares its quote store with the
//! sync engine.
//!
//! ```ignore
//! let (events, rx) = events::channel();
//! let mut catalog = Catalog::open(&config, events)?;
//!
//! catalog.add_quote("Stay hungry.", "Motivation").await?;
//! if let Some(quote) = catalog.random_quote().await? {
//!     println!("{}", quote.text);
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::codec;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{CatalogEvent, EventSender};
use crate::models::{CategoryFilter, Quote};
use crate::session::ViewState;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::store::{QuoteStore, SharedQuoteStore};

/// Counters shown alongside the current quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_quotes: usize,
    pub total_categories: usize,
    pub last_viewed: Option<DateTime<Utc>>,
}

/// Result of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub dropped: usize,
    pub new_categories: Vec<String>,
    pub message: String,
}

/// An export ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub contents: String,
}

/// A quote picked for display
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedQuote {
    pub quote: Quote,
    /// Shown again from the session rather than picked at random
    pub restored: bool,
}

/// Quote collection plus view state
pub struct Catalog {
    store: SharedQuoteStore,
    view: ViewState,
    filter: CategoryFilter,
    events: EventSender,
}

impl Catalog {
    /// Open the catalog backed by the configured data directory
    ///
    /// Session state lives in memory for the lifetime of the process.
    pub fn open(config: &Config, events: EventSender) -> Result<Self> {
        let durable = Arc::new(FileStore::open(config.storage_path())?);
        Self::with_storage(durable, Arc::new(MemoryStore::new()), events)
    }

    /// Open the catalog over explicit durable and session stores
    pub fn with_storage(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        events: EventSender,
    ) -> Result<Self> {
        let store = QuoteStore::load(durable.clone())?;
        let view = ViewState::new(durable, session);
        let filter = view.restore_filter(store.categories())?;
        debug!("Catalog opened with {} quote(s), filter '{}'", store.len(), filter);

        Ok(Self {
            store: store.into_shared(),
            view,
            filter,
            events,
        })
    }

    /// Shared handle to the quote store
    pub fn store(&self) -> SharedQuoteStore {
        self.store.clone()
    }

    /// Sender the catalog reports on
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    /// Active category filter
    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Add a quote and switch the filter to its category
    pub async fn add_quote(&mut self, text: &str, category: &str) -> Result<Quote> {
        let quote = Quote::validated(text, category)?;

        {
            let mut store = self.store.lock().await;
            let is_new_category = !store.categories().contains(&quote.category);
            store.add(quote.clone())?;

            if is_new_category {
                self.events.emit(CatalogEvent::CategoriesChanged(
                    store.categories().categories().to_vec(),
                ));
            }
        }

        info!("Added quote in '{}'", quote.category);
        self.apply_filter(CategoryFilter::Category(quote.category.clone()))?;
        Ok(quote)
    }

    /// Change the active filter
    ///
    /// Accepts `all` or an existing category.
    pub async fn set_filter(&mut self, value: &str) -> Result<CategoryFilter> {
        let value = value.trim();
        {
            let store = self.store.lock().await;
            if !store.categories().is_valid_selection(value) {
                return Err(Error::Validation(format!("Unknown category '{}'", value)));
            }
        }

        let filter = CategoryFilter::parse(value);
        self.apply_filter(filter.clone())?;
        Ok(filter)
    }

    /// Pick a random quote passing the filter
    ///
    /// Returns `None` when the filter matches nothing. The pick is
    /// remembered as the last viewed quote.
    pub async fn random_quote(&self) -> Result<Option<Quote>> {
        let picked = {
            let store = self.store.lock().await;
            let candidates = store.by_category(&self.filter);
            if candidates.is_empty() {
                None
            } else {
                let index = rand::thread_rng().gen_range(0..candidates.len());
                Some(candidates[index].clone())
            }
        };

        let Some(quote) = picked else {
            debug!("No quotes match filter '{}'", self.filter);
            return Ok(None);
        };

        self.view.record_last_viewed(&quote)?;
        self.events.emit(CatalogEvent::QuoteDisplayed(quote.clone()));
        Ok(Some(quote))
    }

    /// The quote to show when a front end starts
    ///
    /// With no filter active, the last quote viewed this session is shown
    /// again; otherwise a random pick.
    pub async fn initial_quote(&self) -> Result<Option<DisplayedQuote>> {
        if self.filter == CategoryFilter::All {
            if let Some(viewed) = self.view.last_viewed()? {
                let quote = viewed.to_quote();
                self.events.emit(CatalogEvent::QuoteDisplayed(quote.clone()));
                return Ok(Some(DisplayedQuote {
                    quote,
                    restored: true,
                }));
            }
        }

        Ok(self.random_quote().await?.map(|quote| DisplayedQuote {
            quote,
            restored: false,
        }))
    }

    /// Quotes passing the active filter, in insertion order
    pub async fn quotes(&self) -> Vec<Quote> {
        let store = self.store.lock().await;
        store.by_category(&self.filter).into_iter().cloned().collect()
    }

    /// Sorted category names
    pub async fn categories(&self) -> Vec<String> {
        self.store.lock().await.categories().categories().to_vec()
    }

    pub async fn stats(&self) -> Result<CatalogStats> {
        let (total_quotes, total_categories) = {
            let store = self.store.lock().await;
            (store.len(), store.categories().len())
        };

        Ok(CatalogStats {
            total_quotes,
            total_categories,
            last_viewed: self.view.last_viewed()?.map(|viewed| viewed.timestamp),
        })
    }

    /// Append every valid quote from a JSON document
    ///
    /// Quotes already in the collection are appended again; import does not
    /// de-duplicate.
    pub async fn import_json(&mut self, raw: &[u8]) -> Result<ImportReport> {
        let mut store = self.store.lock().await;
        let outcome = codec::import_quotes(raw, store.categories())?;
        let imported = store.extend(outcome.quotes)?;

        if !outcome.new_categories.is_empty() {
            self.events.emit(CatalogEvent::CategoriesChanged(
                store.categories().categories().to_vec(),
            ));
        }

        info!(
            "Imported {} quote(s), dropped {}",
            imported, outcome.dropped
        );

        Ok(ImportReport {
            imported,
            dropped: outcome.dropped,
            new_categories: outcome.new_categories,
            message: format!("Successfully imported {} quote(s)", imported),
        })
    }

    /// Render the whole collection for export on `date`
    pub async fn export_json(&self, date: NaiveDate) -> Result<ExportDocument> {
        let store = self.store.lock().await;
        Ok(ExportDocument {
            file_name: codec::export_file_name(date),
            contents: codec::export_quotes(store.all())?,
        })
    }

    fn apply_filter(&mut self, filter: CategoryFilter) -> Result<()> {
        self.view.save_filter(&filter)?;
        self.filter = filter;
        Ok(())
    }
}

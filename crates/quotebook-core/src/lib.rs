//! Quotebook Core Library
//!
//! This crate provides the core functionality for Quotebook, a local-first
//! catalog of categorized quotes that syncs with a remote quote source.
//!
//! # Architecture
//!
//! - **Key-value storage**: Source of truth for quotes and view state, one
//!   atomically rewritten JSON file
//! - **Sync engine**: Fetches remote quotes, merges them or raises a
//!   conflict, pushes the local collection back
//!
//! The catalog and the sync engine share one quote store.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let (events, rx) = events::channel();
//! let mut catalog = Catalog::open(&config, events.clone())?;
//!
//! // Add a quote
//! catalog.add_quote("Stay hungry.", "Motivation").await?;
//!
//! // Sync
//! let remote = Arc::new(HttpRemote::from_config(&config)?);
//! let engine = SyncEngine::new(catalog.store(), remote, events, SyncOptions::from_config(&config));
//! engine.sync().await?;
//! ```
//!
//! # Modules
//!
//! - `catalog`: Quote catalog (main entry point)
//! - `store`: Persisted quote collection
//! - `models`: Quotes, filters and view records
//! - `categories`: Derived category index
//! - `session`: Filter and last-viewed persistence
//! - `codec`: JSON import and export
//! - `sync`: Remote sync engine
//! - `events`: Outward notifications
//! - `storage`: Key-value persistence
//! - `config`: Application configuration

pub mod catalog;
pub mod categories;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;

pub use catalog::{Catalog, CatalogStats, DisplayedQuote, ExportDocument, ImportReport};
pub use categories::CategoryIndex;
pub use config::Config;
pub use error::{Error, Result};
pub use events::{CatalogEvent, EventReceiver, EventSender};
pub use models::{CategoryFilter, LastViewedQuote, Quote, ServerId};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{QuoteStore, SharedQuoteStore};
pub use sync::{
    HttpRemote, RemoteSource, Resolution, SyncEngine, SyncOptions, SyncOutcome, SyncPhase,
    SyncState,
};

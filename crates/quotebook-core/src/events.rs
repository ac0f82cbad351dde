//! Outward notifications
//!
//! The core owns no rendering. Front ends take the receiving half of an
//! event channel and react to what the catalog and sync engine report.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::models::Quote;
use crate::sync::SyncPhase;

/// Events emitted by the catalog and the sync engine
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    /// A quote was picked for display
    QuoteDisplayed(Quote),
    /// The derived category list changed
    CategoriesChanged(Vec<String>),
    /// The sync state machine moved
    SyncStatusChanged {
        phase: SyncPhase,
        message: String,
        time: Option<DateTime<Utc>>,
    },
    /// Remote data diverged from a recent local change
    ConflictRaised {
        candidates: Vec<Quote>,
        message: String,
    },
    /// The pending conflict was resolved
    ConflictResolved,
}

/// Receiving half of the event channel
pub type EventReceiver = mpsc::UnboundedReceiver<CatalogEvent>;

/// Sending half of the event channel
///
/// Cloned into every component that reports events. Sending never fails:
/// events are dropped when nobody listens.
#[derive(Debug, Clone, Default)]
pub struct EventSender {
    tx: Option<mpsc::UnboundedSender<CatalogEvent>>,
}

impl EventSender {
    /// A sender with no listener
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: CatalogEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

/// Create a connected sender/receiver pair
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx: Some(tx) }, rx)
}

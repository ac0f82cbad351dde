//! Sync state
//!
//! Snapshot of where the sync state machine stands. Held in memory by the
//! engine for the lifetime of the process.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::Quote;

/// Sync state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Nothing attempted yet
    #[default]
    Idle,
    /// Fetch/merge in progress
    Syncing,
    /// Last attempt completed
    Synced,
    /// Waiting for the user to resolve a conflict
    Conflict,
    /// Last attempt failed
    Error,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Syncing => "syncing",
            SyncPhase::Synced => "synced",
            SyncPhase::Conflict => "conflict",
            SyncPhase::Error => "error",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote quotes waiting on a user decision
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConflict {
    pub candidate_quotes: Vec<Quote>,
    pub raised_at: DateTime<Utc>,
}

/// Snapshot of the sync engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub phase: SyncPhase,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub auto_sync_enabled: bool,
    pub pending_conflict: Option<PendingConflict>,
    /// Cause of the last failure, cleared by the next successful sync
    pub last_error: Option<String>,
}

impl SyncState {
    /// Check if a conflict blocks further syncs
    pub fn has_pending_conflict(&self) -> bool {
        self.pending_conflict.is_some()
    }
}

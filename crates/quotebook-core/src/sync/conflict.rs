//! Conflict detection and merge
//!
//! Quotes are matched by exact `text`. A fetch that brings quotes the local
//! collection lacks is only merged blindly when the local collection has not
//! been saved within the recency window; otherwise the user decides.
//!
//! This is a timestamp heuristic, not a CRDT: the remote source has no real
//! concurrent writers.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::Quote;

/// Outcome of comparing local and remote collections
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictCheck {
    /// Remote quotes whose text is absent locally, in remote order
    pub new_from_remote: Vec<Quote>,
    /// Whether merging should wait for the user
    pub has_conflict: bool,
}

/// Remote quotes whose text is not in `local`
///
/// Only the first remote quote per text is kept.
pub fn new_from_remote(local: &[Quote], remote: &[Quote]) -> Vec<Quote> {
    let mut known: HashSet<&str> = local.iter().map(|q| q.text.as_str()).collect();
    remote
        .iter()
        .filter(|q| known.insert(q.text.as_str()))
        .cloned()
        .collect()
}

/// Decide whether `remote` can be merged into `local` without asking
///
/// A conflict needs both: something new from the remote, and a local save
/// younger than `window` at `now`. A collection that was never saved is not
/// recent.
pub fn detect_conflict(
    local: &[Quote],
    last_modified: Option<DateTime<Utc>>,
    remote: &[Quote],
    now: DateTime<Utc>,
    window: Duration,
) -> ConflictCheck {
    let new_from_remote = new_from_remote(local, remote);
    let recently_modified = last_modified.is_some_and(|modified| is_recent(modified, now, window));

    ConflictCheck {
        has_conflict: !new_from_remote.is_empty() && recently_modified,
        new_from_remote,
    }
}

/// Local quotes followed by the remote-only ones
pub fn merge(local: &[Quote], remote: &[Quote]) -> Vec<Quote> {
    let mut merged = local.to_vec();
    merged.extend(new_from_remote(local, remote));
    merged
}

/// A save stamped in the future (clock skew) counts as recent
fn is_recent(modified: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    match (now - modified).to_std() {
        Ok(elapsed) => elapsed < window,
        Err(_) => true,
    }
}

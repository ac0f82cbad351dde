//! Sync engine
//!
//! Drives one sync at a time: fetch the remote collection, decide between a
//! blind merge and a conflict, apply the merge, push the result.
//!
//! ```text
//! idle|synced|error --sync--> syncing --+--> synced
//!                                       +--> conflict --resolve--> synced
//!                                       +--> error
//! ```
//!
//! A sync attempted while a conflict is pending, or while another sync is
//! running, is rejected without touching the state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::conflict::detect_conflict;
use super::remote::RemoteSource;
use super::schedule::{spawn_auto_sync, AutoSyncHandle};
use super::state::{PendingConflict, SyncPhase, SyncState};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{CatalogEvent, EventSender};
use crate::models::Quote;
use crate::store::{QuoteStore, SharedQuoteStore};

/// Timing knobs for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Local saves younger than this block a blind merge
    pub conflict_window: Duration,
    /// Period of the auto-sync timer
    pub interval: Duration,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            conflict_window: config.conflict_window(),
            interval: config.sync_interval(),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            conflict_window: Duration::from_secs(60),
            interval: Duration::from_secs(30),
        }
    }
}

/// How to settle a pending conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Merge the remote candidates into the local collection
    AcceptRemote,
    /// Discard the candidates and keep the local collection as is
    KeepLocal,
}

/// Result of an admitted sync attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Remote quotes were merged (possibly none)
    Merged { added: usize },
    /// Merge deferred until the user resolves the conflict
    Conflict { candidates: Vec<Quote> },
}

/// Sync state machine over a shared quote store
pub struct SyncEngine {
    store: SharedQuoteStore,
    remote: Arc<dyn RemoteSource>,
    events: EventSender,
    options: SyncOptions,
    state: Mutex<SyncState>,
    status_tx: watch::Sender<SyncPhase>,
    status_rx: watch::Receiver<SyncPhase>,
    auto_sync: StdMutex<Option<AutoSyncHandle>>,
}

impl SyncEngine {
    pub fn new(
        store: SharedQuoteStore,
        remote: Arc<dyn RemoteSource>,
        events: EventSender,
        options: SyncOptions,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(SyncPhase::Idle);

        Self {
            store,
            remote,
            events,
            options,
            state: Mutex::new(SyncState::default()),
            status_tx,
            status_rx,
            auto_sync: StdMutex::new(None),
        }
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Current phase
    pub fn phase(&self) -> SyncPhase {
        *self.status_rx.borrow()
    }

    /// Subscribe to phase changes
    pub fn subscribe_status(&self) -> watch::Receiver<SyncPhase> {
        self.status_rx.clone()
    }

    /// Copy of the full sync state
    pub async fn snapshot(&self) -> SyncState {
        let mut state = self.state.lock().await.clone();
        state.auto_sync_enabled = self.is_auto_sync_enabled();
        state
    }

    /// Run one sync
    ///
    /// Returns [`Error::ConflictPending`] or [`Error::SyncInProgress`] when the
    /// attempt is not admitted; the state is left untouched in that case.
    /// Any other error has moved the engine to [`SyncPhase::Error`].
    pub async fn sync(&self) -> Result<SyncOutcome> {
        self.admit(None).await?;
        self.run_admitted().await
    }

    /// Run one timer-driven sync unless `active` was cleared
    ///
    /// The flag is checked under the state lock, so once it is cleared no
    /// further attempt is admitted. Returns `None` when skipped.
    pub(crate) async fn sync_if_active(&self, active: &AtomicBool) -> Result<Option<SyncOutcome>> {
        if !self.admit(Some(active)).await? {
            return Ok(None);
        }
        self.run_admitted().await.map(Some)
    }

    async fn run_admitted(&self) -> Result<SyncOutcome> {
        info!("Sync started");

        let remote = match self.remote.fetch().await {
            Ok(quotes) => quotes,
            Err(e) => return Err(self.fail(e).await),
        };
        debug!("Fetched {} remote quote(s)", remote.len());

        let now = Utc::now();
        let mut store = self.store.lock().await;
        let check = detect_conflict(
            store.all(),
            store.last_modified(),
            &remote,
            now,
            self.options.conflict_window,
        );

        if check.has_conflict {
            drop(store);
            return Ok(self.raise_conflict(check.new_from_remote, now).await);
        }

        let added = match self.apply_merge(&mut store, check.new_from_remote) {
            Ok(added) => added,
            Err(e) => {
                drop(store);
                return Err(self.fail(e).await);
            }
        };
        let local = store.all().to_vec();
        drop(store);

        self.push_quietly(&local).await;

        let message = if added == 0 {
            "Already up to date".to_string()
        } else {
            format!("Merged {} quote(s) from server", added)
        };
        self.finish(message, false).await;

        Ok(SyncOutcome::Merged { added })
    }

    /// Settle the pending conflict
    ///
    /// Returns how many quotes were added to the local collection. When the
    /// merge cannot be persisted the conflict stays pending.
    pub async fn resolve(&self, resolution: Resolution) -> Result<usize> {
        let candidates = {
            let state = self.state.lock().await;
            match &state.pending_conflict {
                Some(pending) => pending.candidate_quotes.clone(),
                None => return Err(Error::NoPendingConflict),
            }
        };

        let mut store = self.store.lock().await;
        let added = match resolution {
            Resolution::AcceptRemote => self.apply_merge(&mut store, candidates)?,
            Resolution::KeepLocal => 0,
        };
        let local = store.all().to_vec();
        drop(store);

        info!("Conflict resolved ({:?}), {} quote(s) added", resolution, added);
        self.push_quietly(&local).await;

        let message = match resolution {
            Resolution::AcceptRemote => format!("Accepted {} quote(s) from server", added),
            Resolution::KeepLocal => "Kept local quotes".to_string(),
        };
        self.finish(message, true).await;

        Ok(added)
    }

    /// Start periodic syncing
    ///
    /// One sync runs immediately, then one per interval until
    /// [`disable_auto_sync`](Self::disable_auto_sync). Enabling twice is a
    /// no-op.
    pub fn enable_auto_sync(self: &Arc<Self>) {
        let mut slot = self.auto_sync_slot();
        if slot.is_some() {
            return;
        }

        info!(
            "Auto-sync enabled every {}s",
            self.options.interval.as_secs_f64()
        );
        *slot = Some(spawn_auto_sync(Arc::downgrade(self), self.options.interval));
    }

    /// Stop periodic syncing
    ///
    /// No tick starts after this returns. A sync already running completes.
    pub fn disable_auto_sync(&self) {
        if let Some(handle) = self.auto_sync_slot().take() {
            handle.stop();
            info!("Auto-sync disabled");
        }
    }

    pub fn is_auto_sync_enabled(&self) -> bool {
        self.auto_sync_slot().is_some()
    }

    fn auto_sync_slot(&self) -> std::sync::MutexGuard<'_, Option<AutoSyncHandle>> {
        self.auto_sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Admission gate: one sync at a time, none while a conflict is pending
    ///
    /// Returns `false` when `active` is given and already cleared.
    async fn admit(&self, active: Option<&AtomicBool>) -> Result<bool> {
        {
            let mut state = self.state.lock().await;
            if active.is_some_and(|flag| !flag.load(Ordering::SeqCst)) {
                return Ok(false);
            }
            if state.has_pending_conflict() {
                return Err(Error::ConflictPending);
            }
            if state.phase == SyncPhase::Syncing {
                return Err(Error::SyncInProgress);
            }
            state.phase = SyncPhase::Syncing;
        }

        self.publish(SyncPhase::Syncing, "Syncing with server...".to_string(), None);
        Ok(true)
    }

    /// Append `quotes` not yet present and report category changes
    fn apply_merge(&self, store: &mut QuoteStore, quotes: Vec<Quote>) -> Result<usize> {
        let before = store.categories().clone();
        let added = store.merge_unique(quotes)?;

        if store.categories() != &before {
            self.events.emit(CatalogEvent::CategoriesChanged(
                store.categories().categories().to_vec(),
            ));
        }

        Ok(added)
    }

    async fn raise_conflict(&self, candidates: Vec<Quote>, now: DateTime<Utc>) -> SyncOutcome {
        let message = format!(
            "{} new quote(s) on the server conflict with recent local changes",
            candidates.len()
        );
        warn!("{}", message);

        {
            let mut state = self.state.lock().await;
            state.phase = SyncPhase::Conflict;
            state.pending_conflict = Some(PendingConflict {
                candidate_quotes: candidates.clone(),
                raised_at: now,
            });
        }

        self.publish(SyncPhase::Conflict, message.clone(), None);
        self.events.emit(CatalogEvent::ConflictRaised {
            candidates: candidates.clone(),
            message,
        });

        SyncOutcome::Conflict { candidates }
    }

    /// Move to synced; `resolved` also clears the pending conflict in the same step
    async fn finish(&self, message: String, resolved: bool) {
        let now = Utc::now();
        {
            let mut state = self.state.lock().await;
            if resolved {
                state.pending_conflict = None;
            }
            state.phase = SyncPhase::Synced;
            state.last_sync_time = Some(now);
            state.last_error = None;
        }

        if resolved {
            self.events.emit(CatalogEvent::ConflictResolved);
        }
        info!("Sync finished: {}", message);
        self.publish(SyncPhase::Synced, message, Some(now));
    }

    async fn fail(&self, error: Error) -> Error {
        let cause = error.to_string();
        warn!("Sync failed: {}", cause);

        {
            let mut state = self.state.lock().await;
            state.phase = SyncPhase::Error;
            state.last_error = Some(cause.clone());
        }

        self.publish(SyncPhase::Error, format!("Sync failed: {}", cause), None);
        error
    }

    /// Push the local collection; failures are only logged
    async fn push_quietly(&self, quotes: &[Quote]) {
        if let Err(e) = self.remote.push(quotes).await {
            warn!("Failed to push {} quote(s): {}", quotes.len(), e);
        }
    }

    fn publish(&self, phase: SyncPhase, message: String, time: Option<DateTime<Utc>>) {
        self.status_tx.send_replace(phase);
        self.events
            .emit(CatalogEvent::SyncStatusChanged { phase, message, time });
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.disable_auto_sync();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{self, EventReceiver};
    use crate::storage::{
        KeyValueStore, MemoryStore, StorageError, StorageResult, LAST_MODIFIED_KEY, QUOTES_KEY,
    };
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// In-memory remote with scripted responses
    #[derive(Default)]
    struct FakeRemote {
        quotes: StdMutex<Vec<Quote>>,
        fail_fetch: StdMutex<Option<String>>,
        fail_push: bool,
        fetches: AtomicUsize,
        pushed: StdMutex<Vec<Vec<Quote>>>,
        fetch_delay: Option<Duration>,
    }

    impl FakeRemote {
        fn serving(quotes: Vec<Quote>) -> Self {
            Self {
                quotes: StdMutex::new(quotes),
                ..Default::default()
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn last_push(&self) -> Option<Vec<Quote>> {
            self.pushed.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl RemoteSource for FakeRemote {
        async fn fetch(&self) -> Result<Vec<Quote>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.fetch_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(msg) = self.fail_fetch.lock().unwrap().clone() {
                return Err(Error::Network(msg));
            }
            Ok(self.quotes.lock().unwrap().clone())
        }

        async fn push(&self, quotes: &[Quote]) -> Result<()> {
            self.pushed.lock().unwrap().push(quotes.to_vec());
            if self.fail_push {
                return Err(Error::Network("push refused".to_string()));
            }
            Ok(())
        }
    }

    /// Memory store whose writes can be switched off
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn break_writes(&self, broken: bool) {
            self.fail_writes.store(broken, Ordering::SeqCst);
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key)
        }

        fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Write {
                    path: "local_storage.tmp".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "device unplugged"),
                });
            }
            self.inner.set_many(entries)
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key)
        }
    }

    fn remote_quotes() -> Vec<Quote> {
        vec![
            Quote::new("A", "C1"),
            Quote::new("R1", "Server Wisdom"),
            Quote::new("R2", "Server Inspiration"),
        ]
    }

    /// Store holding `[A/C1, B/C2]`, last saved `age` ago
    fn store_modified(age: chrono::Duration) -> (SharedQuoteStore, Arc<MemoryStore>) {
        store_over(Arc::new(MemoryStore::new()), age)
    }

    fn store_over<S: KeyValueStore + 'static>(
        backend: Arc<S>,
        age: chrono::Duration,
    ) -> (SharedQuoteStore, Arc<S>) {
        let quotes = vec![Quote::new("A", "C1"), Quote::new("B", "C2")];
        backend
            .set_many(&[
                (QUOTES_KEY, serde_json::to_string(&quotes).unwrap().as_str()),
                (LAST_MODIFIED_KEY, (Utc::now() - age).to_rfc3339().as_str()),
            ])
            .unwrap();
        let store = QuoteStore::load(backend.clone()).unwrap().into_shared();
        (store, backend)
    }

    fn engine_with(
        store: SharedQuoteStore,
        remote: Arc<FakeRemote>,
    ) -> (Arc<SyncEngine>, EventReceiver) {
        let (events, rx) = events::channel();
        let engine = SyncEngine::new(store, remote, events, SyncOptions::default());
        (Arc::new(engine), rx)
    }

    async fn texts(store: &SharedQuoteStore) -> Vec<String> {
        store
            .lock()
            .await
            .all()
            .iter()
            .map(|q| q.text.clone())
            .collect()
    }

    fn drain(rx: &mut EventReceiver) -> Vec<CatalogEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_old_local_change_merges_and_pushes() {
        let (store, _) = store_modified(chrono::Duration::minutes(5));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, mut rx) = engine_with(store.clone(), remote.clone());

        let outcome = engine.sync().await.unwrap();

        assert_eq!(outcome, SyncOutcome::Merged { added: 2 });
        assert_eq!(texts(&store).await, vec!["A", "B", "R1", "R2"]);
        assert_eq!(remote.last_push().unwrap().len(), 4);

        let state = engine.snapshot().await;
        assert_eq!(state.phase, SyncPhase::Synced);
        assert!(state.last_sync_time.is_some());
        assert_eq!(engine.phase(), SyncPhase::Synced);

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, CatalogEvent::CategoriesChanged(c) if c.len() == 4)));
        assert!(matches!(
            events.last(),
            Some(CatalogEvent::SyncStatusChanged {
                phase: SyncPhase::Synced,
                time: Some(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_recent_local_change_raises_conflict() {
        let (store, _) = store_modified(chrono::Duration::seconds(10));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, mut rx) = engine_with(store.clone(), remote.clone());

        let outcome = engine.sync().await.unwrap();

        match outcome {
            SyncOutcome::Conflict { candidates } => {
                let texts: Vec<_> = candidates.iter().map(|q| q.text.as_str()).collect();
                assert_eq!(texts, vec!["R1", "R2"]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        // Nothing merged or pushed yet
        assert_eq!(texts(&store).await, vec!["A", "B"]);
        assert!(remote.last_push().is_none());

        let state = engine.snapshot().await;
        assert_eq!(state.phase, SyncPhase::Conflict);
        assert_eq!(state.pending_conflict.unwrap().candidate_quotes.len(), 2);

        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, CatalogEvent::ConflictRaised { candidates, .. } if candidates.len() == 2)));
    }

    #[tokio::test]
    async fn test_sync_rejected_while_conflict_pending() {
        let (store, _) = store_modified(chrono::Duration::seconds(10));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, _rx) = engine_with(store, remote.clone());

        engine.sync().await.unwrap();
        let before = engine.snapshot().await;

        let err = engine.sync().await.unwrap_err();
        assert!(matches!(err, Error::ConflictPending));
        assert_eq!(remote.fetch_count(), 1);
        assert_eq!(engine.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_accept_remote_merges_and_clears_conflict() {
        let (store, _) = store_modified(chrono::Duration::seconds(10));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, mut rx) = engine_with(store.clone(), remote.clone());
        engine.sync().await.unwrap();
        drain(&mut rx);

        let added = engine.resolve(Resolution::AcceptRemote).await.unwrap();

        assert_eq!(added, 2);
        assert_eq!(texts(&store).await, vec!["A", "B", "R1", "R2"]);
        assert_eq!(remote.last_push().unwrap().len(), 4);

        let state = engine.snapshot().await;
        assert_eq!(state.phase, SyncPhase::Synced);
        assert!(state.pending_conflict.is_none());
        assert!(drain(&mut rx).contains(&CatalogEvent::ConflictResolved));
    }

    #[tokio::test]
    async fn test_keep_local_pushes_unchanged_collection() {
        let (store, _) = store_modified(chrono::Duration::seconds(10));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, _rx) = engine_with(store.clone(), remote.clone());
        engine.sync().await.unwrap();

        let added = engine.resolve(Resolution::KeepLocal).await.unwrap();

        assert_eq!(added, 0);
        assert_eq!(texts(&store).await, vec!["A", "B"]);
        let pushed: Vec<_> = remote
            .last_push()
            .unwrap()
            .into_iter()
            .map(|q| q.text)
            .collect();
        assert_eq!(pushed, vec!["A", "B"]);
        assert_eq!(engine.snapshot().await.phase, SyncPhase::Synced);
    }

    #[tokio::test]
    async fn test_resolve_without_conflict() {
        let (store, _) = store_modified(chrono::Duration::minutes(5));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, _rx) = engine_with(store, remote);

        assert!(matches!(
            engine.resolve(Resolution::KeepLocal).await,
            Err(Error::NoPendingConflict)
        ));
        assert_eq!(engine.snapshot().await.phase, SyncPhase::Idle);
    }

    #[tokio::test]
    async fn test_fetch_failure_moves_to_error() {
        let (store, _) = store_modified(chrono::Duration::minutes(5));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        *remote.fail_fetch.lock().unwrap() = Some("connection refused".to_string());
        let (engine, _rx) = engine_with(store.clone(), remote.clone());

        let err = engine.sync().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));

        let state = engine.snapshot().await;
        assert_eq!(state.phase, SyncPhase::Error);
        assert!(state.last_error.unwrap().contains("connection refused"));
        assert_eq!(texts(&store).await, vec!["A", "B"]);

        // The next attempt is admitted and clears the error
        *remote.fail_fetch.lock().unwrap() = None;
        engine.sync().await.unwrap();
        let state = engine.snapshot().await;
        assert_eq!(state.phase, SyncPhase::Synced);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_merge_save_failure_moves_to_error() {
        let (store, backend) = store_over(
            Arc::new(FlakyStore::default()),
            chrono::Duration::minutes(5),
        );
        backend.break_writes(true);
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, _rx) = engine_with(store.clone(), remote.clone());

        let err = engine.sync().await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let state = engine.snapshot().await;
        assert_eq!(state.phase, SyncPhase::Error);
        assert!(state.last_error.unwrap().contains("device unplugged"));
        assert_eq!(texts(&store).await, vec!["A", "B"]);
        assert!(remote.last_push().is_none());
    }

    #[tokio::test]
    async fn test_failed_accept_keeps_conflict_pending() {
        let (store, backend) = store_over(
            Arc::new(FlakyStore::default()),
            chrono::Duration::seconds(10),
        );
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, _rx) = engine_with(store.clone(), remote.clone());
        engine.sync().await.unwrap();

        backend.break_writes(true);
        let err = engine.resolve(Resolution::AcceptRemote).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let state = engine.snapshot().await;
        assert_eq!(state.phase, SyncPhase::Conflict);
        assert_eq!(state.pending_conflict.unwrap().candidate_quotes.len(), 2);
        assert_eq!(texts(&store).await, vec!["A", "B"]);
        assert!(matches!(engine.sync().await, Err(Error::ConflictPending)));

        // Once storage recovers the same conflict can still be accepted
        backend.break_writes(false);
        assert_eq!(engine.resolve(Resolution::AcceptRemote).await.unwrap(), 2);
        assert!(engine.snapshot().await.pending_conflict.is_none());
    }

    #[tokio::test]
    async fn test_resolve_settles_conflict_and_phase_together() {
        let (store, _) = store_modified(chrono::Duration::seconds(10));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, mut rx) = engine_with(store, remote);
        engine.sync().await.unwrap();
        drain(&mut rx);

        engine.resolve(Resolution::KeepLocal).await.unwrap();

        let events = drain(&mut rx);
        let resolved_at = events
            .iter()
            .position(|e| *e == CatalogEvent::ConflictResolved)
            .unwrap();
        assert!(matches!(
            events[resolved_at + 1..],
            [CatalogEvent::SyncStatusChanged {
                phase: SyncPhase::Synced,
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn test_cleared_flag_skips_scheduled_sync() {
        let (store, _) = store_modified(chrono::Duration::minutes(5));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (engine, mut rx) = engine_with(store, remote.clone());

        let active = AtomicBool::new(false);
        assert_eq!(engine.sync_if_active(&active).await.unwrap(), None);
        assert_eq!(remote.fetch_count(), 0);
        assert_eq!(engine.phase(), SyncPhase::Idle);
        assert!(drain(&mut rx).is_empty());

        active.store(true, Ordering::SeqCst);
        assert!(engine.sync_if_active(&active).await.unwrap().is_some());
        assert_eq!(remote.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_push_failure_is_not_surfaced() {
        let (store, _) = store_modified(chrono::Duration::minutes(5));
        let remote = Arc::new(FakeRemote {
            fail_push: true,
            ..FakeRemote::serving(remote_quotes())
        });
        let (engine, _rx) = engine_with(store, remote.clone());

        assert!(engine.sync().await.is_ok());
        assert_eq!(engine.snapshot().await.phase, SyncPhase::Synced);
        assert!(remote.last_push().is_some());
    }

    #[tokio::test]
    async fn test_nothing_new_leaves_last_modified_alone() {
        let (store, _) = store_modified(chrono::Duration::seconds(10));
        let before = store.lock().await.last_modified();
        let remote = Arc::new(FakeRemote::serving(vec![Quote::new("B", "Other")]));
        let (engine, _rx) = engine_with(store.clone(), remote);

        let outcome = engine.sync().await.unwrap();

        assert_eq!(outcome, SyncOutcome::Merged { added: 0 });
        assert_eq!(store.lock().await.last_modified(), before);
    }

    #[tokio::test]
    async fn test_concurrent_sync_is_rejected() {
        let (store, _) = store_modified(chrono::Duration::minutes(5));
        let remote = Arc::new(FakeRemote {
            fetch_delay: Some(Duration::from_millis(200)),
            ..FakeRemote::serving(remote_quotes())
        });
        let (engine, _rx) = engine_with(store, remote.clone());

        let running = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.sync().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(engine.sync().await, Err(Error::SyncInProgress)));
        assert!(running.await.unwrap().is_ok());
        assert_eq!(remote.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_auto_sync_runs_immediately_and_stops() {
        let (store, _) = store_modified(chrono::Duration::minutes(5));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        let (events, _rx) = events::channel();
        let engine = Arc::new(SyncEngine::new(
            store,
            remote.clone(),
            events,
            SyncOptions {
                interval: Duration::from_millis(40),
                ..SyncOptions::default()
            },
        ));

        engine.enable_auto_sync();
        engine.enable_auto_sync();
        assert!(engine.is_auto_sync_enabled());
        assert!(engine.snapshot().await.auto_sync_enabled);

        tokio::time::sleep(Duration::from_millis(150)).await;
        engine.disable_auto_sync();
        assert!(!engine.is_auto_sync_enabled());

        let ticks = remote.fetch_count();
        assert!(ticks >= 2, "expected repeated ticks, got {ticks}");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(remote.fetch_count(), ticks);
    }

    #[tokio::test]
    async fn test_auto_sync_survives_errors() {
        let (store, _) = store_modified(chrono::Duration::minutes(5));
        let remote = Arc::new(FakeRemote::serving(remote_quotes()));
        *remote.fail_fetch.lock().unwrap() = Some("offline".to_string());
        let (events, _rx) = events::channel();
        let engine = Arc::new(SyncEngine::new(
            store,
            remote.clone(),
            events,
            SyncOptions {
                interval: Duration::from_millis(30),
                ..SyncOptions::default()
            },
        ));

        engine.enable_auto_sync();
        tokio::time::sleep(Duration::from_millis(120)).await;
        engine.disable_auto_sync();

        assert!(remote.fetch_count() >= 2);
        assert_eq!(engine.snapshot().await.phase, SyncPhase::Error);
    }
}

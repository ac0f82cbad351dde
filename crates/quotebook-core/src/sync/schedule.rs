//! Auto-sync timer
//!
//! A background task that syncs once right away and then once per interval.
//! The task holds only a weak reference to the engine and exits when the
//! engine is gone or the handle is stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::engine::SyncEngine;

/// Commands sent to the auto-sync task
#[derive(Debug)]
pub enum SyncCommand {
    /// Stop the task
    Shutdown,
}

/// Handle for controlling a running auto-sync task
#[derive(Debug)]
pub struct AutoSyncHandle {
    active: Arc<AtomicBool>,
    command_tx: mpsc::Sender<SyncCommand>,
}

impl AutoSyncHandle {
    /// Stop the task; no tick starts after this returns
    pub fn stop(self) {
        self.active.store(false, Ordering::SeqCst);
        let _ = self.command_tx.try_send(SyncCommand::Shutdown);
    }
}

/// Spawn the auto-sync task for `engine`
pub(crate) fn spawn_auto_sync(engine: Weak<SyncEngine>, interval: Duration) -> AutoSyncHandle {
    let (command_tx, command_rx) = mpsc::channel(1);
    let active = Arc::new(AtomicBool::new(true));

    tokio::spawn(auto_sync_task(engine, interval, active.clone(), command_rx));

    AutoSyncHandle { active, command_tx }
}

async fn auto_sync_task(
    engine: Weak<SyncEngine>,
    interval: Duration,
    active: Arc<AtomicBool>,
    mut command_rx: mpsc::Receiver<SyncCommand>,
) {
    loop {
        if !active.load(Ordering::SeqCst) {
            break;
        }

        match engine.upgrade() {
            Some(engine) => tick(&engine, &active).await,
            None => break,
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            cmd = command_rx.recv() => {
                if matches!(cmd, Some(SyncCommand::Shutdown) | None) {
                    break;
                }
            }
        }
    }

    debug!("Auto-sync task stopped");
}

/// One timer-driven sync; the outcome never stops the timer
async fn tick(engine: &SyncEngine, active: &AtomicBool) {
    match engine.sync_if_active(active).await {
        Ok(Some(_)) => {}
        Ok(None) => debug!("Auto-sync tick skipped: timer stopped"),
        Err(e) if e.is_rejected_attempt() => {
            debug!("Auto-sync tick skipped: {}", e);
        }
        Err(e) => {
            warn!("Auto-sync tick failed: {}", e);
        }
    }
}

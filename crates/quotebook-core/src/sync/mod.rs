//! Sync with a remote quote source
//!
//! ## Flow
//!
//! 1. Fetch the remote collection
//! 2. Compare it with the local collection by quote text
//! 3. Merge blindly, or hold the new quotes as a conflict when the local
//!    collection changed recently
//! 4. Push the local collection back
//!
//! ## Usage
//!
//! ```ignore
//! let remote = Arc::new(HttpRemote::from_config(&config)?);
//! let engine = Arc::new(SyncEngine::new(store, remote, events, SyncOptions::from_config(&config)));
//! match engine.sync().await? {
//!     SyncOutcome::Conflict { .. } => engine.resolve(Resolution::AcceptRemote).await?,
//!     SyncOutcome::Merged { added } => added,
//! };
//! ```

pub mod conflict;
mod engine;
pub mod remote;
mod schedule;
mod state;

pub use conflict::{detect_conflict, merge, ConflictCheck};
pub use engine::{Resolution, SyncEngine, SyncOptions, SyncOutcome};
pub use remote::{HttpRemote, RemoteSource};
pub use schedule::{AutoSyncHandle, SyncCommand};
pub use state::{PendingConflict, SyncPhase, SyncState};

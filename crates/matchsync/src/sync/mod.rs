//! Player match-window sync.
//!
//! # Module Structure
//!
//! - [`types`] - `SyncOptions`, `SyncReport`, `SyncOutcome`, `SyncError`
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`keyed_lock`] - Per-player mutual exclusion
//! - [`engine`] - The sync state machine: `MatchSyncer`

pub mod engine;
pub mod keyed_lock;
mod progress;
mod types;

pub use engine::MatchSyncer;
pub use keyed_lock::KeyedLocks;
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use types::{
    CacheProvenance, DEFAULT_WINDOW, DataQuality, SyncError, SyncOptions, SyncOutcome, SyncReport,
};

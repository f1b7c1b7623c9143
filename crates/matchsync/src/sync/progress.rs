//! Progress reporting for sync operations.

use super::types::SyncOutcome;

/// Progress events emitted while syncing a player.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Sync started; the player's lock is held.
    SyncStarted { player_id: String, window: usize },

    /// A cached window was found.
    CacheLoaded {
        player_id: String,
        matches: usize,
        latest_match_id: Option<String>,
    },

    /// No cached window exists; a full sync follows.
    CacheMissing { player_id: String },

    /// The cache could not be read and is treated as missing.
    CacheReadFailed { player_id: String, error: String },

    /// Asking upstream for its newest match ID.
    CheckingFreshness { player_id: String },

    /// Upstream's newest match is already cached.
    CacheFresh { player_id: String },

    /// Paginating match IDs.
    FetchingIds {
        player_id: String,
        cap: usize,
        stop_at: Option<String>,
    },

    /// Pagination finished.
    FetchedIds {
        player_id: String,
        count: usize,
        rate_limited: bool,
        watermark_found: bool,
    },

    /// Starting detail fetches.
    FetchingDetails {
        count: usize,
        concurrency: usize,
        batch_size: usize,
    },

    /// One match detail arrived.
    FetchedDetail { match_id: String },

    /// One match detail failed and was dropped.
    DetailError { match_id: String, error: String },

    /// Upstream answered 429.
    RateLimited { retry_after_secs: u64 },

    /// Detail fetching finished.
    DetailsComplete {
        fetched: usize,
        requested: usize,
        rate_limited: bool,
    },

    /// The window was persisted.
    CacheWritten { player_id: String, matches: usize },

    /// Persisting the window failed; the window is still returned.
    CacheWriteFailed { player_id: String, error: String },

    /// Sync finished.
    SyncComplete {
        player_id: String,
        outcome: SyncOutcome,
        matches: usize,
        new_matches: usize,
        rate_limited: bool,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

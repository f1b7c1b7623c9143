//! Sync options, reports and errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::projection::MatchRecord;
use crate::riot::UpstreamError;
use crate::riot::rate_limits::{
    DEFAULT_DETAIL_BATCH_SIZE, DEFAULT_DETAIL_CONCURRENCY, RIOT_DEFAULT_RPS,
};
use crate::store::PlayerCache;

/// Default number of matches kept per player.
pub const DEFAULT_WINDOW: usize = 300;

/// Options for syncing a player's match window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum matches kept per player (W).
    pub window: usize,
    /// Maximum detail requests in flight.
    pub concurrency: usize,
    /// Throughput ceiling for detail requests.
    pub requests_per_second: u32,
    /// IDs dispatched per detail batch.
    pub batch_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            concurrency: DEFAULT_DETAIL_CONCURRENCY,
            requests_per_second: RIOT_DEFAULT_RPS,
            batch_size: DEFAULT_DETAIL_BATCH_SIZE,
        }
    }
}

/// How a sync resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOutcome {
    /// No cache existed; the window was built from scratch.
    Created,
    /// Upstream's newest match is the cached watermark.
    UpToDate,
    /// New matches were merged into the cached window.
    Incremental,
    /// The watermark was no longer upstream; the window was rebuilt.
    Resynced,
    /// The freshness check was rate-limited; cached data returned as-is.
    ServedFromCache,
}

impl SyncOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::UpToDate => "upToDate",
            Self::Incremental => "incremental",
            Self::Resynced => "resynced",
            Self::ServedFromCache => "servedFromCache",
        }
    }

    /// Whether the returned window came straight from the cache.
    pub fn is_from_cache(self) -> bool {
        matches!(self, Self::UpToDate | Self::ServedFromCache)
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheProvenance {
    pub served_from_cache: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub warnings: Vec<String>,
}

/// Result of syncing one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub player_id: String,
    /// The window, newest first.
    pub matches: Vec<MatchRecord>,
    /// Fewer matches than requested because of a rate limit.
    pub rate_limited: bool,
    /// Length of `matches`.
    pub fetched_matches: usize,
    /// Records fetched from upstream in this run.
    pub new_matches: usize,
    pub requested_cap: usize,
    pub outcome: SyncOutcome,
    pub cache: CacheProvenance,
    pub data_quality: DataQuality,
    /// Set when the window could not be persisted.
    pub cache_write_error: Option<String>,
}

impl SyncReport {
    pub(crate) fn from_cache(
        cache: PlayerCache,
        outcome: SyncOutcome,
        requested_cap: usize,
        new_matches: usize,
        rate_limited: bool,
    ) -> Self {
        Self {
            player_id: cache.player_id,
            fetched_matches: cache.matches.len(),
            matches: cache.matches,
            rate_limited,
            new_matches,
            requested_cap,
            outcome,
            cache: CacheProvenance {
                served_from_cache: outcome.is_from_cache(),
                updated_at: cache.updated_at,
            },
            data_quality: DataQuality::default(),
            cache_write_error: None,
        }
    }
}

/// Errors that abort a sync without touching the cache.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("upstream error while syncing {player_id}: {source}")]
    Upstream {
        player_id: String,
        #[source]
        source: UpstreamError,
    },

    /// A spawned player sync panicked or was cancelled.
    #[error("sync task for {player_id} failed: {message}")]
    Task { player_id: String, message: String },
}

impl SyncError {
    pub(crate) fn upstream(player_id: &str, source: UpstreamError) -> Self {
        Self::Upstream {
            player_id: player_id.to_string(),
            source,
        }
    }

    /// HTTP status of the underlying upstream failure (0 when none).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Upstream { source, .. } => source.status_code(),
            Self::Task { .. } => crate::riot::NO_STATUS,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Upstream { source, .. } if source.is_timeout())
    }

    pub fn player_id(&self) -> &str {
        match self {
            Self::Upstream { player_id, .. } | Self::Task { player_id, .. } => player_id,
        }
    }
}

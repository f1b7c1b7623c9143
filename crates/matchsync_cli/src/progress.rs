//! Progress reporting for sync operations.
//!
//! Sync progress events become structured `tracing` records on stderr, leaving
//! stdout free for the JSON reports.

use std::sync::Arc;

use matchsync::sync::{ProgressCallback, SyncProgress};

/// Logging reporter using tracing for structured output.
#[derive(Debug, Default)]
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    /// Convert to a ProgressCallback for the library.
    pub fn as_callback(self: &Arc<Self>) -> Arc<ProgressCallback> {
        let reporter = Arc::clone(self);
        Arc::new(Box::new(move |event| {
            reporter.handle(event);
        }))
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::SyncStarted { player_id, window } => {
                tracing::debug!(player_id = %player_id, window, "Sync started");
            }

            SyncProgress::CacheLoaded {
                player_id,
                matches,
                latest_match_id,
            } => {
                tracing::debug!(
                    player_id = %player_id,
                    matches,
                    latest_match_id = ?latest_match_id,
                    "Loaded cached window"
                );
            }

            SyncProgress::CacheMissing { player_id } => {
                tracing::info!(player_id = %player_id, "No cached window, fetching full history");
            }

            SyncProgress::CacheReadFailed { player_id, error } => {
                tracing::warn!(player_id = %player_id, error = %error, "Cache unreadable, treating as missing");
            }

            SyncProgress::CheckingFreshness { player_id } => {
                tracing::debug!(player_id = %player_id, "Checking for new matches");
            }

            SyncProgress::CacheFresh { player_id } => {
                tracing::info!(player_id = %player_id, "Cache is up to date");
            }

            SyncProgress::FetchingIds {
                player_id,
                cap,
                stop_at,
            } => {
                tracing::debug!(player_id = %player_id, cap, stop_at = ?stop_at, "Fetching match IDs");
            }

            SyncProgress::FetchedIds {
                player_id,
                count,
                rate_limited,
                watermark_found,
            } => {
                tracing::info!(
                    player_id = %player_id,
                    count,
                    rate_limited,
                    watermark_found,
                    "Fetched match IDs"
                );
            }

            SyncProgress::FetchingDetails {
                count,
                concurrency,
                batch_size,
            } => {
                tracing::info!(count, concurrency, batch_size, "Fetching match details");
            }

            SyncProgress::FetchedDetail { match_id } => {
                tracing::debug!(match_id = %match_id, "Fetched match");
            }

            SyncProgress::DetailError { match_id, error } => {
                tracing::warn!(match_id = %match_id, error = %error, "Failed to fetch match");
            }

            SyncProgress::RateLimited { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Rate limited, keeping partial results");
            }

            SyncProgress::DetailsComplete {
                fetched,
                requested,
                rate_limited,
            } => {
                tracing::info!(fetched, requested, rate_limited, "Match details complete");
            }

            SyncProgress::CacheWritten { player_id, matches } => {
                tracing::debug!(player_id = %player_id, matches, "Saved to cache");
            }

            SyncProgress::CacheWriteFailed { player_id, error } => {
                tracing::error!(player_id = %player_id, error = %error, "Failed to save cache");
            }

            // The engine logs completion itself.
            SyncProgress::SyncComplete { .. } => {}

            _ => {}
        }
    }
}

//! Player sync engine.
//!
//! A sync walks a small state machine under the player's lock:
//!
//! - no usable cache: paginate up to the window, fetch, project, write
//! - cache written with a smaller window: refetch from the top and rebuild
//! - cache written with a larger window: truncate, then continue below
//! - cache present: ask upstream for its newest ID (one request)
//!   - rate limited: return the cached window untouched
//!   - newest ID is the watermark (or history is empty): return the cache
//!   - otherwise: paginate back to the watermark, fetch, project, merge, write
//!
//! If delta pagination runs out without meeting the watermark and without a
//! rate limit, the watermark has vanished upstream and the window is rebuilt
//! from the fetched records alone.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use matchsync::riot::RiotClient;
//! use matchsync::store::MemoryStore;
//! use matchsync::sync::{MatchSyncer, SyncOptions};
//!
//! let syncer = MatchSyncer::new(client, Arc::new(MemoryStore::new()), SyncOptions::default());
//! let report = syncer.sync_player(puuid, None).await?;
//! println!("{} matches ({})", report.fetched_matches, report.outcome);
//! ```

mod merge;

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tokio::sync::Semaphore;

use super::keyed_lock::KeyedLocks;
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{SyncError, SyncOptions, SyncOutcome, SyncReport};
use crate::projection::{MatchRecord, project_match};
use crate::riot::{
    ApiRateLimiter, FetchOutcome, FetchedMatch, RiotClient, collect_match_ids, fetch_details,
};
use crate::store::{CacheStore, PlayerCache};

use merge::{merge_window, rebuild_window};

/// Syncs player match windows between the Riot API and a cache store.
///
/// Clones share the store, the throughput ceiling and the per-player locks.
#[derive(Clone)]
pub struct MatchSyncer {
    client: RiotClient,
    store: Arc<dyn CacheStore>,
    limiter: ApiRateLimiter,
    locks: Arc<KeyedLocks>,
    options: SyncOptions,
}

impl MatchSyncer {
    pub fn new(client: RiotClient, store: Arc<dyn CacheStore>, options: SyncOptions) -> Self {
        Self {
            limiter: ApiRateLimiter::new(options.requests_per_second),
            locks: Arc::new(KeyedLocks::new()),
            client,
            store,
            options,
        }
    }

    /// Share a throughput ceiling with other syncers.
    #[must_use]
    pub fn with_limiter(mut self, limiter: ApiRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Share per-player locks with other syncers.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<KeyedLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    fn window(&self) -> usize {
        self.options.window.max(1)
    }

    /// Sync one player and return their current window.
    ///
    /// Concurrent calls for the same player run one after another; the second
    /// sees the first one's write.
    ///
    /// # Errors
    /// Returns [`SyncError::Upstream`] when the freshness check or pagination
    /// fails with anything other than a rate limit. The cache is not touched.
    pub async fn sync_player(
        &self,
        player_id: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<SyncReport, SyncError> {
        let _guard = self.locks.lock(player_id).await;
        let window = self.window();

        emit(
            on_progress,
            SyncProgress::SyncStarted {
                player_id: player_id.to_string(),
                window,
            },
        );

        let cached = match self.store.read(player_id).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(player_id, error = %e, "Cache read failed, syncing from scratch");
                emit(
                    on_progress,
                    SyncProgress::CacheReadFailed {
                        player_id: player_id.to_string(),
                        error: e.to_string(),
                    },
                );
                None
            }
        };

        let report = match cached {
            Some(cache) => {
                emit(
                    on_progress,
                    SyncProgress::CacheLoaded {
                        player_id: player_id.to_string(),
                        matches: cache.matches.len(),
                        latest_match_id: cache.latest_match_id.clone(),
                    },
                );
                self.refresh(player_id, cache, window, on_progress).await?
            }
            None => {
                emit(
                    on_progress,
                    SyncProgress::CacheMissing {
                        player_id: player_id.to_string(),
                    },
                );
                self.full_sync(player_id, window, on_progress).await?
            }
        };

        tracing::info!(
            player_id,
            outcome = %report.outcome,
            matches = report.fetched_matches,
            new_matches = report.new_matches,
            rate_limited = report.rate_limited,
            "Player sync complete"
        );
        emit(
            on_progress,
            SyncProgress::SyncComplete {
                player_id: player_id.to_string(),
                outcome: report.outcome,
                matches: report.fetched_matches,
                new_matches: report.new_matches,
                rate_limited: report.rate_limited,
            },
        );

        Ok(report)
    }

    /// Sync several players concurrently, returning results in input order.
    pub async fn sync_players(
        &self,
        player_ids: &[String],
        on_progress: Option<Arc<ProgressCallback>>,
    ) -> Vec<Result<SyncReport, SyncError>> {
        let player_concurrency = std::cmp::max(1, self.options.concurrency / 4);
        let semaphore = Arc::new(Semaphore::new(player_concurrency));

        let mut handles = Vec::with_capacity(player_ids.len());
        for player_id in player_ids {
            let syncer = self.clone();
            let player_id = player_id.clone();
            let semaphore = Arc::clone(&semaphore);
            let on_progress = on_progress.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return Err(SyncError::Task {
                        player_id,
                        message: "semaphore closed unexpectedly".to_string(),
                    });
                };
                syncer.sync_player(&player_id, on_progress.as_deref()).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, player_id) in handles.into_iter().zip(player_ids) {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(SyncError::Task {
                    player_id: player_id.clone(),
                    message: e.to_string(),
                }),
            });
        }
        results
    }

    async fn full_sync(
        &self,
        player_id: &str,
        window: usize,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<SyncReport, SyncError> {
        let fetched = self.fetch(player_id, window, None, on_progress).await?;

        let mut warnings = fetched.warnings;
        let matches = rebuild_window(fetched.records, window);
        let new_matches = matches.len();
        let cache = PlayerCache {
            player_id: player_id.to_string(),
            matches,
            latest_match_id: fetched.ids.first().cloned(),
            updated_at: Utc::now().trunc_subsecs(3),
            requested_cap: window,
        };

        let write_error = self.persist(&cache, on_progress).await;
        let mut report = SyncReport::from_cache(
            cache,
            SyncOutcome::Created,
            window,
            new_matches,
            fetched.rate_limited,
        );
        report.data_quality.warnings.append(&mut warnings);
        report.cache_write_error = write_error;
        Ok(report)
    }

    async fn refresh(
        &self,
        player_id: &str,
        mut cache: PlayerCache,
        window: usize,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<SyncReport, SyncError> {
        if cache.requested_cap < window {
            return self.regrow(player_id, cache, window, on_progress).await;
        }

        // A smaller window only drops the oldest records; the watermark stays.
        let shrunk = cache.requested_cap > window;
        if shrunk {
            tracing::info!(
                player_id,
                cached_cap = cache.requested_cap,
                window,
                "Window shrank, truncating cached matches"
            );
            cache.matches.truncate(window);
            cache.requested_cap = window;
        }

        emit(
            on_progress,
            SyncProgress::CheckingFreshness {
                player_id: player_id.to_string(),
            },
        );

        let head = match self.client.fetch_match_ids(player_id, 0, 1).await {
            FetchOutcome::Success(ids) => ids.into_iter().next(),
            FetchOutcome::RateLimited { retry_after_secs } => {
                tracing::info!(
                    player_id,
                    retry_after_secs,
                    "Freshness check rate limited, serving cached window"
                );
                emit(on_progress, SyncProgress::RateLimited { retry_after_secs });
                return Ok(self
                    .serve_cached(cache, SyncOutcome::ServedFromCache, shrunk, on_progress)
                    .await);
            }
            FetchOutcome::Error(e) => return Err(SyncError::upstream(player_id, e)),
        };

        let head = match head {
            Some(head) if cache.latest_match_id.as_deref() != Some(head.as_str()) => head,
            _ => {
                tracing::debug!(player_id, "Cached window is up to date");
                emit(
                    on_progress,
                    SyncProgress::CacheFresh {
                        player_id: player_id.to_string(),
                    },
                );
                return Ok(self
                    .serve_cached(cache, SyncOutcome::UpToDate, shrunk, on_progress)
                    .await);
            }
        };

        let stop_at = cache.latest_match_id.clone();
        let fetched = self
            .fetch(player_id, window, stop_at.as_deref(), on_progress)
            .await?;

        let watermark_vanished =
            stop_at.is_some() && !fetched.watermark_found && !fetched.rate_limited;
        let new_matches = fetched.records.len();
        let (outcome, matches) = if watermark_vanished {
            tracing::info!(
                player_id,
                watermark = ?stop_at,
                "Watermark no longer upstream, rebuilding window"
            );
            (
                SyncOutcome::Resynced,
                rebuild_window(fetched.records, window),
            )
        } else {
            (
                SyncOutcome::Incremental,
                merge_window(fetched.records, cache.matches, window),
            )
        };

        let mut warnings = fetched.warnings;
        let cache = PlayerCache {
            player_id: player_id.to_string(),
            matches,
            latest_match_id: Some(head),
            updated_at: Utc::now().trunc_subsecs(3),
            requested_cap: window,
        };

        let write_error = self.persist(&cache, on_progress).await;
        let mut report =
            SyncReport::from_cache(cache, outcome, window, new_matches, fetched.rate_limited);
        report.data_quality.warnings.append(&mut warnings);
        report.cache_write_error = write_error;
        Ok(report)
    }

    /// Return the cached window without fetching, writing it back if it was
    /// truncated to a smaller window.
    async fn serve_cached(
        &self,
        cache: PlayerCache,
        outcome: SyncOutcome,
        truncated: bool,
        on_progress: Option<&ProgressCallback>,
    ) -> SyncReport {
        let write_error = if truncated {
            self.persist(&cache, on_progress).await
        } else {
            None
        };
        let requested_cap = cache.requested_cap;
        let rate_limited = outcome == SyncOutcome::ServedFromCache;
        let mut report = SyncReport::from_cache(cache, outcome, requested_cap, 0, rate_limited);
        report.cache_write_error = write_error;
        report
    }

    /// Refetch history from the top after the window grew past the cached cap.
    ///
    /// Older matches the smaller window never held are only reachable this
    /// way; the watermark alone would report the cache as up to date.
    async fn regrow(
        &self,
        player_id: &str,
        cache: PlayerCache,
        window: usize,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<SyncReport, SyncError> {
        tracing::info!(
            player_id,
            cached_cap = cache.requested_cap,
            window,
            "Window grew, refetching history"
        );
        let fetched = self.fetch(player_id, window, None, on_progress).await?;

        let new_matches = fetched.records.len();
        // Partial results never discard what the cache already holds.
        let matches = if fetched.rate_limited {
            merge_window(fetched.records, cache.matches, window)
        } else {
            rebuild_window(fetched.records, window)
        };

        let mut warnings = fetched.warnings;
        let cache = PlayerCache {
            player_id: player_id.to_string(),
            matches,
            latest_match_id: fetched.ids.first().cloned().or(cache.latest_match_id),
            updated_at: Utc::now().trunc_subsecs(3),
            requested_cap: window,
        };

        let write_error = self.persist(&cache, on_progress).await;
        let mut report = SyncReport::from_cache(
            cache,
            SyncOutcome::Resynced,
            window,
            new_matches,
            fetched.rate_limited,
        );
        report.data_quality.warnings.append(&mut warnings);
        report.cache_write_error = write_error;
        Ok(report)
    }

    /// Paginate, fetch details and project.
    async fn fetch(
        &self,
        player_id: &str,
        cap: usize,
        stop_at: Option<&str>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Fetched, SyncError> {
        emit(
            on_progress,
            SyncProgress::FetchingIds {
                player_id: player_id.to_string(),
                cap,
                stop_at: stop_at.map(str::to_string),
            },
        );

        let ids = collect_match_ids(&self.client, player_id, cap, stop_at)
            .await
            .map_err(|e| SyncError::upstream(player_id, e))?;

        emit(
            on_progress,
            SyncProgress::FetchedIds {
                player_id: player_id.to_string(),
                count: ids.ids.len(),
                rate_limited: ids.rate_limited,
                watermark_found: ids.watermark_found,
            },
        );

        let details = fetch_details(
            &self.client,
            &ids.ids,
            &self.limiter,
            self.options.concurrency,
            self.options.batch_size,
            on_progress,
        )
        .await;

        let mut warnings = Vec::new();
        if details.failed > 0 {
            warnings.push(format!(
                "{} match detail(s) failed to fetch and were skipped",
                details.failed
            ));
        }
        let records = project_all(&details.matches, player_id, &mut warnings);

        Ok(Fetched {
            records,
            warnings,
            rate_limited: ids.rate_limited || details.rate_limited,
            watermark_found: ids.watermark_found,
            ids: ids.ids,
        })
    }

    /// Write the cache, returning the error text on failure.
    async fn persist(
        &self,
        cache: &PlayerCache,
        on_progress: Option<&ProgressCallback>,
    ) -> Option<String> {
        match self.store.write(cache).await {
            Ok(()) => {
                emit(
                    on_progress,
                    SyncProgress::CacheWritten {
                        player_id: cache.player_id.clone(),
                        matches: cache.matches.len(),
                    },
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    player_id = %cache.player_id,
                    error = %e,
                    "Cache write failed, returning unsaved window"
                );
                emit(
                    on_progress,
                    SyncProgress::CacheWriteFailed {
                        player_id: cache.player_id.clone(),
                        error: e.to_string(),
                    },
                );
                Some(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for MatchSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSyncer")
            .field("client", &self.client)
            .field("limiter", &self.limiter)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Records fetched in one pass.
struct Fetched {
    ids: Vec<String>,
    records: Vec<MatchRecord>,
    warnings: Vec<String>,
    rate_limited: bool,
    watermark_found: bool,
}

fn project_all(
    matches: &[FetchedMatch],
    player_id: &str,
    warnings: &mut Vec<String>,
) -> Vec<MatchRecord> {
    matches
        .iter()
        .map(|fetched| {
            let record = project_match(fetched, player_id);
            if record.participant_fallback {
                tracing::debug!(match_id = %record.id, player_id, "Player not among participants");
                warnings.push(format!(
                    "{}: player not found among participants, used first participant",
                    record.id
                ));
            }
            if !record.duration_seconds.is_some_and(|d| d > 0) {
                tracing::debug!(match_id = %record.id, "Match has no usable duration");
                warnings.push(format!(
                    "{}: match duration missing, per-minute metrics unavailable",
                    record.id
                ));
            }
            record
        })
        .collect()
}

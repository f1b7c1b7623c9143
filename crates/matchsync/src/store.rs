//! Durable per-player cache of projected match windows.
//!
//! The sync engine only talks to the [`CacheStore`] trait. [`DbCacheStore`]
//! persists through SeaORM; [`MemoryStore`] keeps everything in process for
//! tests and throwaway runs.

mod database;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::MatchRecord;

pub use database::DbCacheStore;
pub use memory::MemoryStore;

/// Errors that can occur during cache store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The stored match window could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// One player's cached match window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCache {
    pub player_id: String,
    /// Newest first, never longer than `requested_cap`.
    pub matches: Vec<MatchRecord>,
    /// Watermark: the newest match ID confirmed at the last sync.
    pub latest_match_id: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub requested_cap: usize,
}

/// Row summary returned by [`CacheStore::list_players`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPlayer {
    pub player_id: String,
    pub match_count: usize,
    pub latest_match_id: Option<String>,
    pub requested_cap: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&PlayerCache> for CachedPlayer {
    fn from(cache: &PlayerCache) -> Self {
        Self {
            player_id: cache.player_id.clone(),
            match_count: cache.matches.len(),
            latest_match_id: cache.latest_match_id.clone(),
            requested_cap: cache.requested_cap,
            updated_at: cache.updated_at,
        }
    }
}

/// Storage boundary for player caches.
///
/// `write` replaces the whole entry atomically: a concurrent reader sees either
/// the old window or the new one, never a mix.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read(&self, player_id: &str) -> Result<Option<PlayerCache>>;

    async fn write(&self, cache: &PlayerCache) -> Result<()>;

    /// All cached players, most recently updated first.
    async fn list_players(&self) -> Result<Vec<CachedPlayer>>;

    /// Remove a player's entry. Returns whether one existed.
    async fn delete(&self, player_id: &str) -> Result<bool>;
}

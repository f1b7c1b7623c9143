//! Matchsync - an incrementally refreshed, rate-limit aware match history cache.
//!
//! This library fetches a player's match history from the Riot match-v5 API,
//! projects each match into a compact per-player record and keeps a bounded,
//! newest-first window per player in a durable cache. Later syncs only fetch
//! matches newer than the cached watermark.
//!
//! # Features
//!
//! - `sqlite` (default) / `postgres` - Database backends for the cache store.
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use matchsync::riot::{DEFAULT_REGION_HOST, DEFAULT_TIMEOUT, RiotClient};
//! use matchsync::store::DbCacheStore;
//! use matchsync::sync::{MatchSyncer, SyncOptions};
//!
//! let db = matchsync::connect_and_migrate("sqlite://matchsync.db?mode=rwc").await?;
//! let client = RiotClient::new(DEFAULT_REGION_HOST, &api_key, DEFAULT_TIMEOUT)?;
//! let syncer = MatchSyncer::new(client, Arc::new(DbCacheStore::new(db)), SyncOptions::default());
//!
//! let report = syncer.sync_player(puuid, None).await?;
//! ```

pub mod db;
pub mod entity;
pub mod http;
pub mod projection;
pub mod riot;
pub mod store;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use projection::{MatchRecord, PerMinute, Role, TeamObjectives};
pub use riot::{ApiRateLimiter, FetchOutcome, RiotClient, UpstreamError, rate_limits};
pub use store::{CacheStore, DbCacheStore, MemoryStore, PlayerCache, StoreError};
pub use sync::{MatchSyncer, SyncError, SyncOptions, SyncOutcome, SyncReport};

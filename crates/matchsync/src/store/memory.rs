use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{CacheStore, CachedPlayer, PlayerCache, Result};

/// In-process cache store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, PlayerCache>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, PlayerCache>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn read(&self, player_id: &str) -> Result<Option<PlayerCache>> {
        Ok(self.entries().get(player_id).cloned())
    }

    async fn write(&self, cache: &PlayerCache) -> Result<()> {
        self.entries()
            .insert(cache.player_id.clone(), cache.clone());
        Ok(())
    }

    async fn list_players(&self) -> Result<Vec<CachedPlayer>> {
        let mut players: Vec<CachedPlayer> = self.entries().values().map(CachedPlayer::from).collect();
        players.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(players)
    }

    async fn delete(&self, player_id: &str) -> Result<bool> {
        Ok(self.entries().remove(player_id).is_some())
    }
}

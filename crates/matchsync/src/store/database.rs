use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set, sea_query::OnConflict};

use super::{CacheStore, CachedPlayer, PlayerCache, Result};
use crate::entity::player_cache::{ActiveModel, Column, Entity as PlayerCacheEntity, Model};
use crate::projection::MatchRecord;

/// SeaORM-backed cache store: one `player_cache` row per player.
#[derive(Debug)]
pub struct DbCacheStore {
    db: DatabaseConnection,
}

impl DbCacheStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn cap_from_row(cap: i32) -> usize {
    usize::try_from(cap).unwrap_or(0)
}

fn into_cache(model: Model) -> Result<PlayerCache> {
    let matches: Vec<MatchRecord> = serde_json::from_value(model.matches)?;
    Ok(PlayerCache {
        player_id: model.player_id,
        matches,
        latest_match_id: model.latest_match_id,
        updated_at: model.updated_at.with_timezone(&Utc),
        requested_cap: cap_from_row(model.requested_cap),
    })
}

#[async_trait]
impl CacheStore for DbCacheStore {
    async fn read(&self, player_id: &str) -> Result<Option<PlayerCache>> {
        PlayerCacheEntity::find_by_id(player_id.to_string())
            .one(&self.db)
            .await?
            .map(into_cache)
            .transpose()
    }

    /// Upsert in a single statement so the row is replaced atomically.
    async fn write(&self, cache: &PlayerCache) -> Result<()> {
        let model = ActiveModel {
            player_id: Set(cache.player_id.clone()),
            matches: Set(serde_json::to_value(&cache.matches)?),
            latest_match_id: Set(cache.latest_match_id.clone()),
            requested_cap: Set(i32::try_from(cache.requested_cap).unwrap_or(i32::MAX)),
            updated_at: Set(cache.updated_at.fixed_offset()),
        };

        PlayerCacheEntity::insert(model)
            .on_conflict(
                OnConflict::column(Column::PlayerId)
                    .update_columns([
                        Column::Matches,
                        Column::LatestMatchId,
                        Column::RequestedCap,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn list_players(&self) -> Result<Vec<CachedPlayer>> {
        let rows = PlayerCacheEntity::find()
            .order_by_desc(Column::UpdatedAt)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| into_cache(row).map(|cache| CachedPlayer::from(&cache)))
            .collect()
    }

    async fn delete(&self, player_id: &str) -> Result<bool> {
        let result = PlayerCacheEntity::delete_by_id(player_id.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

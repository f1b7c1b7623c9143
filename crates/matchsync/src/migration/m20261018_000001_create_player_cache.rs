//! Initial migration: the per-player cache table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlayerCache::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlayerCache::PlayerId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlayerCache::Matches).json().not_null())
                    .col(ColumnDef::new(PlayerCache::LatestMatchId).string().null())
                    .col(
                        ColumnDef::new(PlayerCache::RequestedCap)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlayerCache::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_player_cache_updated_at")
                    .table(PlayerCache::Table)
                    .col(PlayerCache::UpdatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlayerCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "player_cache")]
enum PlayerCache {
    Table,
    PlayerId,
    Matches,
    LatestMatchId,
    RequestedCap,
    UpdatedAt,
}

//! PlayerCache entity - one cached match window per player.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A player's cached match window.
///
/// The whole window lives in one JSON column so a write replaces it in a
/// single statement.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "player_cache")]
pub struct Model {
    /// Stable player ID (PUUID).
    #[sea_orm(primary_key, auto_increment = false)]
    pub player_id: String,

    /// Projected match records, newest first.
    pub matches: Json,

    /// Newest match ID confirmed at the last sync.
    #[sea_orm(nullable)]
    pub latest_match_id: Option<String>,

    /// Window size requested when the row was written.
    pub requested_cap: i32,

    /// When this row was last written.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

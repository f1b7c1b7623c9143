//! Common re-exports for convenient entity usage.

pub use super::player_cache::{
    ActiveModel as PlayerCacheActiveModel, Column as PlayerCacheColumn, Entity as PlayerCacheEntity,
    Model as PlayerCacheModel,
};

//! SeaORM entity definitions for the matchsync database schema.

pub mod player_cache;
pub mod prelude;

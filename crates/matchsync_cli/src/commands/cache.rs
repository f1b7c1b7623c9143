//! Cache maintenance commands.
//!
//! These read and delete entries directly through the cache store. They never
//! call upstream and never run inside a sync.

use std::io::Write;

use clap::Subcommand;
use matchsync::store::{CacheStore, DbCacheStore};

use crate::output::write_json;

/// Cache subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Print a player's cached window as JSON
    Show {
        /// Player ID (PUUID)
        player_id: String,

        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// List cached players, most recently updated first
    List {
        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Delete a player's cached window
    Clear {
        /// Player ID (PUUID)
        player_id: String,
    },
}

/// Handle cache commands.
pub async fn handle_cache(
    action: CacheAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = matchsync::connect_and_migrate(database_url).await?;
    let store = DbCacheStore::new(db);
    run(action, &store, &mut std::io::stdout().lock()).await
}

async fn run(
    action: CacheAction,
    store: &dyn CacheStore,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CacheAction::Show { player_id, compact } => {
            let cache = store
                .read(&player_id)
                .await?
                .ok_or_else(|| format!("No cached window for player '{player_id}'"))?;
            write_json(out, &cache, compact)?;
        }
        CacheAction::List { compact } => {
            let players = store.list_players().await?;
            write_json(out, &players, compact)?;
        }
        CacheAction::Clear { player_id } => {
            if store.delete(&player_id).await? {
                tracing::info!(player_id = %player_id, "Cleared cached window");
                eprintln!("Cleared cached window for '{player_id}'.");
            } else {
                eprintln!("No cached window for '{player_id}'.");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use matchsync::store::{MemoryStore, PlayerCache};

    use super::*;

    fn cache(player_id: &str, secs: i64) -> PlayerCache {
        PlayerCache {
            player_id: player_id.to_string(),
            matches: Vec::new(),
            latest_match_id: Some(format!("{player_id}_1")),
            updated_at: Utc.timestamp_opt(secs, 0).single().expect("timestamp"),
            requested_cap: 300,
        }
    }

    async fn output(action: CacheAction, store: &MemoryStore) -> serde_json::Value {
        let mut out = Vec::new();
        run(action, store, &mut out).await.expect("command");
        serde_json::from_slice(&out).expect("json output")
    }

    #[tokio::test]
    async fn show_prints_the_cached_window() {
        let store = MemoryStore::new();
        store.write(&cache("alice", 10)).await.expect("write");

        let value = output(
            CacheAction::Show {
                player_id: "alice".to_string(),
                compact: true,
            },
            &store,
        )
        .await;

        assert_eq!(value["playerId"], "alice");
        assert_eq!(value["latestMatchId"], "alice_1");
        assert_eq!(value["requestedCap"], 300);
    }

    #[tokio::test]
    async fn show_unknown_player_is_an_error() {
        let store = MemoryStore::new();
        let mut out = Vec::new();
        let err = run(
            CacheAction::Show {
                player_id: "ghost".to_string(),
                compact: false,
            },
            &store,
            &mut out,
        )
        .await
        .expect_err("missing player");

        assert!(err.to_string().contains("ghost"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn list_orders_by_most_recent_update() {
        let store = MemoryStore::new();
        store.write(&cache("old", 10)).await.expect("write");
        store.write(&cache("new", 20)).await.expect("write");

        let value = output(CacheAction::List { compact: false }, &store).await;
        let ids: Vec<&str> = value
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|p| p["playerId"].as_str())
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn clear_removes_only_that_player() {
        let store = MemoryStore::new();
        store.write(&cache("alice", 10)).await.expect("write");
        store.write(&cache("bob", 10)).await.expect("write");

        let mut out = Vec::new();
        run(
            CacheAction::Clear {
                player_id: "alice".to_string(),
            },
            &store,
            &mut out,
        )
        .await
        .expect("clear");

        assert!(store.read("alice").await.expect("read").is_none());
        assert!(store.read("bob").await.expect("read").is_some());
    }
}

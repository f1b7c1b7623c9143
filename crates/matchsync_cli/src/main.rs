//! Matchsync CLI - command-line interface for the match history cache.

mod commands;
mod config;
mod output;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::cache::CacheAction;
use crate::commands::sync::SyncArgs;

#[derive(Parser)]
#[command(name = "matchsync")]
#[command(version)]
#[command(about = "An incrementally refreshed match history cache")]
#[command(
    long_about = "Matchsync keeps a bounded, newest-first window of each player's \
matches from the Riot match-v5 API in a local database. Later syncs only fetch \
matches newer than the cached watermark, and rate limits produce partial results \
instead of failures."
)]
#[command(after_long_help = r#"EXAMPLES
    Sync one player and print the report:
        $ matchsync sync <PUUID>

    Sync several players, one JSON document per line:
        $ matchsync sync <PUUID> <PUUID> --compact

    Keep only the last 50 matches, on the European host:
        $ matchsync sync <PUUID> --window 50 --region-host https://europe.api.riotgames.com

    Inspect what is cached:
        $ matchsync cache list

    Generate shell completions:
        $ matchsync completions bash > ~/.local/share/bash-completion/completions/matchsync

CONFIGURATION
    Matchsync reads configuration from:
      1. ~/.config/matchsync/config.toml (or $XDG_CONFIG_HOME/matchsync/config.toml)
      2. ./matchsync.toml
      3. Environment variables (MATCHSYNC_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    MATCHSYNC_DATABASE_URL       Database connection string (default: ~/.local/state/matchsync/matchsync.db)
    MATCHSYNC_RIOT_API_KEY       Riot API key (RIOT_API_KEY and API_KEY are also accepted)
    MATCHSYNC_RIOT_REGION_HOST   Regional routing host (default: https://americas.api.riotgames.com)
    MATCHSYNC_RIOT_TIMEOUT_SECS  Per-request timeout in seconds (default: 8)
    MATCHSYNC_SYNC_WINDOW        Matches kept per player (default: 300)
    RUST_LOG                     Log filter (default: matchsync=info,matchsync_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync players' match windows and print one JSON report per player
    Sync(SyncArgs),
    /// Inspect or clear cached windows
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

fn init_tracing() {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("matchsync=info,matchsync_cli=info"),
    };

    // stdout carries JSON, so logs always go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(Term::stderr().is_term())
        .with_target(false)
        .init();
}

/// Create the parent directory of a SQLite database file.
fn ensure_sqlite_dir(database_url: &str) -> std::io::Result<()> {
    let Some(db_path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    // Strip query parameters (e.g., ?mode=rwc) before path operations
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    let db_path = std::path::Path::new(db_path);

    if db_path.is_relative() && !db_path.as_os_str().is_empty() {
        tracing::warn!(
            "Database path '{}' is relative - behavior depends on current directory. \
             Consider using an absolute path.",
            db_path.display()
        );
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Handle commands that don't require database access first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();
    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set MATCHSYNC_DATABASE_URL")?;
    ensure_sqlite_dir(&database_url)?;

    match cli.command {
        Commands::Sync(args) => {
            commands::sync::handle_sync(args, &config, &database_url).await?;
        }
        Commands::Cache { action } => {
            commands::cache::handle_cache(action, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}

//! Configuration file support for matchsync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`MATCHSYNC_DATABASE_URL`, `MATCHSYNC_RIOT_API_KEY`, ...)
//! 3. Local config file (./matchsync.toml)
//! 4. XDG config file (~/.config/matchsync/config.toml)
//! 5. Built-in defaults
//!
//! The API key additionally falls back to the legacy `RIOT_API_KEY` and
//! `API_KEY` variables when nothing above sets it.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/matchsync/matchsync.db"  # optional, this is the default
//!
//! [riot]
//! api_key = "RGAPI-..."  # or use MATCHSYNC_RIOT_API_KEY / RIOT_API_KEY
//! region_host = "https://europe.api.riotgames.com"
//! timeout_secs = 8
//!
//! [sync]
//! window = 300
//! concurrency = 20
//! requests_per_second = 20
//! batch_size = 20
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config as ConfigBuilder, ConfigBuilder as Builder, File, FileFormat};
use directories::ProjectDirs;
use matchsync::riot::{DEFAULT_REGION_HOST, DEFAULT_TIMEOUT};
use matchsync::sync::SyncOptions;
use serde::Deserialize;

const APP_NAME: &str = "matchsync";

/// Environment variables and the config keys they override.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("MATCHSYNC_DATABASE_URL", "database.url"),
    ("MATCHSYNC_RIOT_API_KEY", "riot.api_key"),
    ("MATCHSYNC_RIOT_REGION_HOST", "riot.region_host"),
    ("MATCHSYNC_RIOT_TIMEOUT_SECS", "riot.timeout_secs"),
    ("MATCHSYNC_SYNC_WINDOW", "sync.window"),
    ("MATCHSYNC_SYNC_CONCURRENCY", "sync.concurrency"),
    ("MATCHSYNC_SYNC_REQUESTS_PER_SECOND", "sync.requests_per_second"),
    ("MATCHSYNC_SYNC_BATCH_SIZE", "sync.batch_size"),
];

/// Older variable names still honoured for the API key.
const LEGACY_API_KEY_VARS: &[&str] = &["RIOT_API_KEY", "API_KEY"];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub riot: RiotConfig,
    /// Default sync options.
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// Riot API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RiotConfig {
    pub api_key: Option<String>,
    /// Regional routing host for match-v5.
    pub region_host: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            region_host: DEFAULT_REGION_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Matches kept per player.
    pub window: usize,
    /// Maximum detail requests in flight.
    pub concurrency: usize,
    pub requests_per_second: u32,
    pub batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let defaults = SyncOptions::default();
        Self {
            window: defaults.window,
            concurrency: defaults.concurrency,
            requests_per_second: defaults.requests_per_second,
            batch_size: defaults.batch_size,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Falls back to defaults (with a warning) when the sources cannot be
    /// parsed, so a broken config file never blocks `completions` or `man`.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("matchsync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./matchsync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let builder = apply_env_overrides(builder, |name| std::env::var(name).ok());

        match Self::from_builder(builder) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}", e);
                Config::default()
            }
        }
    }

    fn from_builder(builder: Builder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter creates the SQLite file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("matchsync.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the API key, consulting the legacy variables last.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    fn api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        non_empty(self.riot.api_key.clone()).or_else(|| {
            LEGACY_API_KEY_VARS
                .iter()
                .find_map(|name| non_empty(lookup(name)))
        })
    }

    pub fn riot_timeout(&self) -> Duration {
        Duration::from_secs(self.riot.timeout_secs.max(1))
    }

    /// Sync options from the `[sync]` section.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            window: self.sync.window,
            concurrency: self.sync.concurrency,
            requests_per_second: self.sync.requests_per_second,
            batch_size: self.sync.batch_size,
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/matchsync` or `~/.local/state/matchsync`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

/// Layer `MATCHSYNC_*` variables over the file sources.
fn apply_env_overrides(
    mut builder: Builder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Builder<DefaultState> {
    for (var, key) in ENV_OVERRIDES {
        if let Some(value) = non_empty(lookup(var)) {
            // Keys are static, so this only fails if one is malformed.
            builder = match builder.clone().set_override(*key, value) {
                Ok(next) => next,
                Err(e) => {
                    tracing::warn!(var, error = %e, "Ignoring environment override");
                    builder
                }
            };
        }
    }
    builder
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//! Sync command: refresh one or more players' cached match windows.
//!
//! Each player's report is printed to stdout as JSON in argument order.
//! Progress and errors go to stderr.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use console::{Term, style};
use matchsync::riot::RiotClient;
use matchsync::store::DbCacheStore;
use matchsync::sync::{MatchSyncer, SyncError, SyncOptions, SyncReport};

use crate::config::Config;
use crate::output::write_json;
use crate::progress::LoggingReporter;
use crate::shutdown;

/// Options for the sync command.
#[derive(Debug, Clone, clap::Args)]
pub struct SyncArgs {
    /// Player ID(s) (PUUID) - can specify multiple
    #[arg(required = true)]
    pub player_ids: Vec<String>,

    /// Matches kept per player (default from config or 300)
    #[arg(short = 'w', long)]
    pub window: Option<usize>,

    /// Maximum concurrent detail requests (default from config or 20)
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Detail requests per second (default from config or 20)
    #[arg(short = 'r', long = "rps")]
    pub requests_per_second: Option<u32>,

    /// Match IDs per detail batch (default from config or 20)
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Regional routing host (default from config or the Americas host)
    #[arg(short = 'H', long)]
    pub region_host: Option<String>,

    /// Print one single-line JSON report per player
    #[arg(long)]
    pub compact: bool,
}

impl SyncArgs {
    /// Apply command-line overrides on top of configured options.
    fn options(&self, base: SyncOptions) -> SyncOptions {
        SyncOptions {
            window: self.window.unwrap_or(base.window),
            concurrency: self.concurrency.unwrap_or(base.concurrency),
            requests_per_second: self.requests_per_second.unwrap_or(base.requests_per_second),
            batch_size: self.batch_size.unwrap_or(base.batch_size),
        }
    }

    /// Player IDs in argument order with repeats dropped.
    fn unique_players(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.player_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}

/// Handle the sync command.
pub async fn handle_sync(
    args: SyncArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = config.api_key().ok_or(
        "No Riot API key configured. Set [riot] api_key in the config file, \
         MATCHSYNC_RIOT_API_KEY or RIOT_API_KEY.",
    )?;
    let region_host = args
        .region_host
        .clone()
        .unwrap_or_else(|| config.riot.region_host.clone());
    let options = args.options(config.sync_options());
    let players = args.unique_players();

    let db = matchsync::connect_and_migrate(database_url).await?;
    let client = RiotClient::new(&region_host, &api_key, config.riot_timeout())?;
    let syncer = MatchSyncer::new(client, Arc::new(DbCacheStore::new(db)), options.clone());

    tracing::info!(
        players = players.len(),
        region_host = %region_host,
        window = options.window,
        concurrency = options.concurrency,
        requests_per_second = options.requests_per_second,
        "Syncing players"
    );

    let reporter = Arc::new(LoggingReporter::new());
    let results = tokio::select! {
        results = syncer.sync_players(&players, Some(reporter.as_callback())) => results,
        _ = shutdown::ctrl_c() => std::process::exit(shutdown::INTERRUPTED_EXIT_CODE),
    };

    let show_summary = Term::stderr().is_term();
    let failed = write_reports(
        &mut std::io::stdout().lock(),
        &results,
        args.compact,
        |line| {
            if show_summary {
                eprintln!("{line}");
            }
        },
    )?;

    if failed > 0 {
        return Err(format!("{failed} of {} player syncs failed", results.len()).into());
    }
    Ok(())
}

/// Print successful reports as JSON and log failures.
///
/// Returns how many players failed.
fn write_reports(
    out: &mut impl Write,
    results: &[Result<SyncReport, SyncError>],
    compact: bool,
    mut summary: impl FnMut(String),
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut failed = 0;
    for result in results {
        match result {
            Ok(report) => {
                write_json(out, report, compact)?;
                summary(summary_line(report));
            }
            Err(e) => {
                failed += 1;
                tracing::error!(
                    player_id = %e.player_id(),
                    status = e.status_code(),
                    timeout = e.is_timeout(),
                    error = %e,
                    "Sync failed"
                );
                summary(format!("{} {}", style("✗").red(), e));
            }
        }
    }
    Ok(failed)
}

fn summary_line(report: &SyncReport) -> String {
    let mark = if report.rate_limited || report.cache_write_error.is_some() {
        style("!").yellow()
    } else {
        style("✓").green()
    };
    let mut line = format!(
        "{} {}: {} ({} matches, {} new)",
        mark,
        report.player_id,
        report.outcome,
        report.fetched_matches,
        report.new_matches
    );
    if report.rate_limited {
        line.push_str(", rate limited");
    }
    if let Some(err) = &report.cache_write_error {
        line.push_str(&format!(", cache not saved: {err}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use clap::Parser;
    use matchsync::riot::UpstreamError;
    use matchsync::sync::{CacheProvenance, DataQuality, SyncOutcome};

    use super::*;
    use crate::{Cli, Commands};

    fn parse(args: &[&str]) -> SyncArgs {
        let cli = Cli::try_parse_from(args).expect("args should parse");
        match cli.command {
            Commands::Sync(args) => args,
            _ => panic!("expected the sync command"),
        }
    }

    fn report(player_id: &str, rate_limited: bool) -> SyncReport {
        SyncReport {
            player_id: player_id.to_string(),
            matches: Vec::new(),
            rate_limited,
            fetched_matches: 0,
            new_matches: 0,
            requested_cap: 300,
            outcome: SyncOutcome::Created,
            cache: CacheProvenance {
                served_from_cache: false,
                updated_at: Utc.timestamp_opt(0, 0).single().expect("timestamp"),
            },
            data_quality: DataQuality::default(),
            cache_write_error: None,
        }
    }

    #[test]
    fn flags_override_configured_options() {
        let args = parse(&[
            "matchsync", "sync", "p1", "--window", "50", "--rps", "5", "-b", "10",
        ]);
        let options = args.options(SyncOptions::default());

        assert_eq!(options.window, 50);
        assert_eq!(options.requests_per_second, 5);
        assert_eq!(options.batch_size, 10);
        assert_eq!(options.concurrency, SyncOptions::default().concurrency);
    }

    #[test]
    fn requires_at_least_one_player() {
        assert!(Cli::try_parse_from(["matchsync", "sync"]).is_err());
    }

    #[test]
    fn repeated_players_are_synced_once() {
        let args = parse(&["matchsync", "sync", "a", "b", "a", "--compact"]);
        assert!(args.compact);
        assert_eq!(args.unique_players(), vec!["a", "b"]);
    }

    #[test]
    fn reports_print_in_order_and_failures_are_counted() {
        let results = vec![
            Ok(report("a", false)),
            Err(SyncError::Upstream {
                player_id: "b".to_string(),
                source: UpstreamError::Status {
                    status: 403,
                    body: "Forbidden".to_string(),
                },
            }),
            Ok(report("c", true)),
        ];

        let mut out = Vec::new();
        let mut lines = Vec::new();
        let failed = write_reports(&mut out, &results, true, |line| lines.push(line))
            .expect("write");

        assert_eq!(failed, 1);
        let text = String::from_utf8(out).expect("utf8");
        let players: Vec<String> = text
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).expect("json line");
                value["playerId"].as_str().unwrap_or_default().to_string()
            })
            .collect();
        assert_eq!(players, vec!["a", "c"]);

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("403"));
        assert!(lines[2].contains("rate limited"));
    }
}

/// Headshot seeding
///
/// Walks every NFL player bet in the store plus any `--file` seed lists (one name per
/// line) and resolves each name through the headshot fetcher, one request at a time
/// behind a rate limiter. Prints saved / cached / failed at the end.
///
/// Spuštění:
///   cargo run --bin seed-headshots -- --file seed/nfl_award_candidates.txt

use std::collections::HashSet;
use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use futures_tracker::{config::Config, state::AppState};
use governor::{Quota, RateLimiter};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn parse_args() -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--file" => files.push(PathBuf::from(args.next().context("--file needs a path")?)),
            other => bail!("unknown argument {other}; usage: seed-headshots [--file path]..."),
        }
    }
    Ok(files)
}

fn read_names(path: &PathBuf) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!("seed file {} unreadable: {}", path.display(), e);
            Vec::new()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let seed_files = parse_args()?;

    // Single instance lock
    let lock_file_path = env::temp_dir().join("futures_tracker_seed_headshots.lock");
    let lock_file = File::create(&lock_file_path)
        .with_context(|| format!("create lock file {}", lock_file_path.display()))?;
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => guard,
        Err(_) => {
            warn!("Another seed-headshots run is already in progress! Exiting.");
            return Ok(());
        }
    };

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let book = state.store.load().await?;
    let store_names = book
        .iter()
        .filter(|b| b.sport == "NFL" && b.is_player_bet())
        .map(|b| b.selection.trim().to_string());
    let file_names = seed_files.iter().flat_map(read_names);
    for name in store_names.chain(file_names) {
        if !name.is_empty() && seen.insert(name.to_lowercase()) {
            names.push(name);
        }
    }

    info!("🏈 Fetching headshots for {} NFL players...", names.len());

    let quota = Quota::with_period(Duration::from_millis(1250)).context("invalid rate limit period")?;
    let limiter = RateLimiter::direct(quota);

    let (mut saved, mut cached, mut failed) = (0usize, 0usize, 0usize);
    for (i, name) in names.iter().enumerate() {
        match state.headshots.cache().get(name) {
            Ok(Some(_)) => {
                cached += 1;
                info!("[{}/{}] ✅ Already cached: {}", i + 1, names.len(), name);
                continue;
            }
            Ok(None) => {}
            Err(e) => warn!("cache read failed for {}: {:#}", name, e),
        }

        limiter.until_ready().await;
        match state.headshots.fetch(name).await {
            Some(found) if found.cached => {
                cached += 1;
                info!("[{}/{}] ✅ Already cached: {}", i + 1, names.len(), name);
            }
            Some(found) => {
                saved += 1;
                info!("[{}/{}] 🎉 Saved: {} → {}", i + 1, names.len(), name, found.url);
            }
            None => {
                failed += 1;
                warn!("[{}/{}] ❌ Not found: {}", i + 1, names.len(), name);
            }
        }
    }

    info!("📊 Summary: {} saved, {} already cached, {} failed", saved, cached, failed);
    Ok(())
}

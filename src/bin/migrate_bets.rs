/// Legacy bets import
///
/// Reads an old `bets.json` (league/tabLabel/player/odds/site records, arrays or keyed
/// objects), normalizes every record, gives it a push-id, and inserts it into the
/// configured store oldest first so each bucket ends up newest-first.
///
/// Spuštění:
///   cargo run --bin migrate-bets -- legacy/bets.json --headshots legacy/headshots.json

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bet_store::{BetBook, PushIdGenerator};
use dotenv::dotenv;
use futures_tracker::{config::Config, state::AppState};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

struct Args {
    bets: PathBuf,
    headshots: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut bets = None;
    let mut headshots = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headshots" => {
                headshots = Some(PathBuf::from(args.next().context("--headshots needs a path")?));
            }
            other if other.starts_with("--") => bail!("unknown flag {other}"),
            other => bets = Some(PathBuf::from(other)),
        }
    }
    Ok(Args {
        bets: bets.context("usage: migrate-bets <legacy.json> [--headshots mapping.json]")?,
        headshots,
    })
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

    let args = parse_args()?;
    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    let raw = std::fs::read_to_string(&args.bets)
        .with_context(|| format!("read {}", args.bets.display()))?;
    let legacy = BetBook::from_value(serde_json::from_str(&raw).context("legacy file is not JSON")?);

    let ids = PushIdGenerator::new();
    let mut bets: Vec<_> = legacy.iter().cloned().collect();
    for bet in bets.iter_mut().filter(|b| b.id.starts_with("legacy-")) {
        bet.id = ids.next_at(bet.created_at);
    }
    bets.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    info!("=== Migrating {} bets into {} store ===", bets.len(), state.store.backend());
    let mut inserted = 0usize;
    let mut evicted = 0usize;
    for bet in bets {
        let label = format!("{}/{} {}", bet.sport, bet.category, bet.selection);
        match state.store.insert(bet).await {
            Ok(outcome) => {
                inserted += 1;
                evicted += outcome.evicted;
            }
            Err(e) => warn!("skipped {}: {}", label, e),
        }
    }
    info!("✅ inserted {} bets ({} evicted by the bucket cap)", inserted, evicted);

    if let Some(path) = args.headshots {
        let raw = std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let mapping: serde_json::Value = serde_json::from_str(&raw).context("headshot mapping is not JSON")?;
        let imported = state.headshots.cache().import_mapping(&mapping)?;
        info!("📸 imported {} headshot URLs", imported);
    }

    Ok(())
}

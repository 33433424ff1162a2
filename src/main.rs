/// Futures Tracker — server
///
/// Serves the Bet API, headshot lookups, `/api/snap`, Discord interactions and the
/// futures page on one port.
///
/// Spuštění:
///   cargo run --bin futures-server

use anyhow::{Context, Result};
use dotenv::dotenv;
use futures_tracker::{build_router, config::Config, shutdown_signal, state::AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let config = Config::from_env()?;

    info!("=== Futures Tracker ===");
    info!("Store: {} (cap {} per bucket)", config.backend_label(), config.bucket_cap);
    info!("Headshot autofetch: {}", config.headshot_autofetch);
    info!("Logs: ./{}/", config.log_dir);
    if !config.discord_enabled() {
        warn!("Discord interactions disabled (DISCORD_PUBLIC_KEY not set)");
    }
    if config.public_base_url.is_none() {
        warn!("PUBLIC_BASE_URL not set: /futures screenshots for Discord will fail");
    }

    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!("🚀 Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

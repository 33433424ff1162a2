/// Slash command sync
///
/// Lists the registered commands, deletes the ones this bot no longer defines, and
/// bulk-overwrites the set with the current `futures` definition. Guild scope
/// (`GUILD_ID`) unless `--global` is passed.
///
/// Spuštění:
///   cargo run --bin sync-commands -- --global

use anyhow::{bail, Context, Result};
use discord::{commands::{desired_commands, stale_commands}, CommandScope, DiscordRest};
use dotenv::dotenv;
use futures_tracker::config::Config;
use tracing::info;
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

    let mut global = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--global" => global = true,
            "--guild" => global = false,
            other => bail!("unknown argument {other}; usage: sync-commands [--guild|--global]"),
        }
    }

    let config = Config::from_env()?;
    let token = config.discord_token.clone().context("DISCORD_TOKEN is required")?;
    let app_id = config.client_id.clone().context("CLIENT_ID is required")?;
    let scope = if global {
        CommandScope::Global
    } else {
        CommandScope::Guild(config.guild_id.clone().context("GUILD_ID is required (or pass --global)")?)
    };

    let rest = DiscordRest::new(config.discord_api_base.clone(), Some(token))?;
    let desired = desired_commands();

    let existing = rest.list_commands(&app_id, &scope).await?;
    info!("{} scope: {} command(s) registered", scope.label(), existing.len());

    for stale in stale_commands(&existing, &desired) {
        rest.delete_command(&app_id, &scope, &stale.id).await?;
        info!("🗑️ deleted stale command /{} ({})", stale.name, stale.id);
    }

    let registered = rest.overwrite_commands(&app_id, &scope, &desired).await?;
    for cmd in &registered {
        info!("✅ /{} registered ({})", cmd.name, cmd.id);
    }
    Ok(())
}

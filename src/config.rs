use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bet_store::DEFAULT_BUCKET_CAP;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    File(PathBuf),
    Firebase { database_url: String, auth: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub bucket_cap: usize,
    pub storage_bucket: Option<String>,
    pub headshot_db: PathBuf,
    pub headshot_dir: PathBuf,
    pub headshot_autofetch: bool,
    pub chrome_path: Option<PathBuf>,
    pub snap_timeout: Duration,
    pub log_dir: String,
    pub discord_token: Option<String>,
    pub discord_public_key: Option<String>,
    pub client_id: Option<String>,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub public_base_url: Option<String>,
    pub discord_api_base: String,
}

fn opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_default(key: &str, default: &str) -> String {
    opt(key).unwrap_or_else(|| default.to_string())
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid {key}={raw:?}")),
        None => Ok(default),
    }
}

fn flag(key: &str, default: bool) -> Result<bool> {
    match opt(key).map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => bail!("invalid {key}={v:?}, expected true/false"),
        },
    }
}

impl Config {
    /// Read the environment; call after `dotenv().ok()`.
    pub fn from_env() -> Result<Self> {
        let store = match or_default("STORE_BACKEND", "file").to_lowercase().as_str() {
            "file" => StoreBackend::File(PathBuf::from(or_default("BETS_FILE", "data/bets.json"))),
            "firebase" => StoreBackend::Firebase {
                database_url: opt("FIREBASE_DATABASE_URL")
                    .context("STORE_BACKEND=firebase requires FIREBASE_DATABASE_URL")?,
                auth: opt("FIREBASE_AUTH"),
            },
            other => bail!("invalid STORE_BACKEND={other:?}, expected file or firebase"),
        };

        let bucket_cap: usize = parsed("BUCKET_CAP", DEFAULT_BUCKET_CAP)?;
        if bucket_cap == 0 {
            bail!("BUCKET_CAP must be at least 1");
        }

        Ok(Self {
            bind_addr: parsed("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3001)))?,
            store,
            bucket_cap,
            storage_bucket: opt("FIREBASE_STORAGE_BUCKET"),
            headshot_db: PathBuf::from(or_default("HEADSHOT_DB", "data/headshots.db")),
            headshot_dir: PathBuf::from(or_default("HEADSHOT_DIR", "data/headshots")),
            headshot_autofetch: flag("HEADSHOT_AUTOFETCH", true)?,
            chrome_path: opt("CHROME_PATH").map(PathBuf::from),
            snap_timeout: Duration::from_secs(parsed("SNAP_TIMEOUT_SECS", 25u64)?),
            log_dir: or_default("LOG_DIR", "logs"),
            discord_token: opt("DISCORD_TOKEN"),
            discord_public_key: opt("DISCORD_PUBLIC_KEY"),
            client_id: opt("CLIENT_ID"),
            guild_id: opt("GUILD_ID"),
            channel_id: opt("CHANNEL_ID"),
            public_base_url: opt("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            discord_api_base: or_default("DISCORD_API_BASE", discord::DEFAULT_API_BASE),
        })
    }

    /// Interactions can be served only with a verification key.
    pub fn discord_enabled(&self) -> bool {
        self.discord_public_key.is_some()
    }

    pub fn backend_label(&self) -> &'static str {
        match self.store {
            StoreBackend::File(_) => "file",
            StoreBackend::Firebase { .. } => "firebase",
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bet_store::{BetStore, FirebaseStore, JsonFileStore};
use discord::{ChannelPoster, DiscordRest, InteractionNotifier, InteractionVerifier};
use headshots::{FirebaseStorage, HeadshotCache, HeadshotFetcher, ImageStorage, LocalDirStorage};
use logger::EventLogger;
use snapper::{ChromeSnapper, Snapper};
use tracing::{info, warn};

use crate::config::{Config, StoreBackend};

/// Public path the local headshot directory is served under.
pub const HEADSHOT_ROUTE: &str = "/headshots";

#[derive(Debug, Clone)]
pub struct Settings {
    pub public_base_url: Option<String>,
    pub channel_id: Option<String>,
    pub snap_timeout: Duration,
    pub headshot_autofetch: bool,
    pub headshot_dir: Option<std::path::PathBuf>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BetStore>,
    pub headshots: Arc<HeadshotFetcher>,
    pub snapper: Arc<dyn Snapper>,
    pub notifier: Arc<dyn InteractionNotifier>,
    /// `None` without a bot token.
    pub channel: Option<Arc<dyn ChannelPoster>>,
    /// `None` without a public key; the interactions route then rejects everything.
    pub verifier: Option<InteractionVerifier>,
    pub events: Arc<EventLogger>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let store: Arc<dyn BetStore> = match &cfg.store {
            StoreBackend::File(path) => {
                info!("bet store: JSON file {}", path.display());
                Arc::new(JsonFileStore::new(path.clone(), cfg.bucket_cap))
            }
            StoreBackend::Firebase { database_url, auth } => {
                info!("bet store: Firebase RTDB {}", database_url);
                Arc::new(FirebaseStore::new(database_url, auth.clone(), cfg.bucket_cap)?)
            }
        };

        let storage: Arc<dyn ImageStorage> = match &cfg.storage_bucket {
            Some(bucket) => Arc::new(FirebaseStorage::new(bucket.clone())?),
            None => Arc::new(LocalDirStorage::new(cfg.headshot_dir.clone(), HEADSHOT_ROUTE)),
        };
        info!("headshot storage: {}", storage.name());
        let local_dir = cfg.storage_bucket.is_none().then(|| cfg.headshot_dir.clone());

        let cache = HeadshotCache::open(&cfg.headshot_db)
            .with_context(|| format!("open headshot cache {}", cfg.headshot_db.display()))?;
        let headshots = HeadshotFetcher::new(cache, storage)?.with_chrome_path(cfg.chrome_path.clone());

        let rest = Arc::new(DiscordRest::new(cfg.discord_api_base.clone(), cfg.discord_token.clone())?);
        let channel: Option<Arc<dyn ChannelPoster>> = if rest.has_bot_token() {
            Some(rest.clone())
        } else {
            warn!("DISCORD_TOKEN not set: share and upload are disabled");
            None
        };

        let verifier = match &cfg.discord_public_key {
            Some(hex) => Some(InteractionVerifier::from_hex(hex).context("invalid DISCORD_PUBLIC_KEY")?),
            None => {
                warn!("DISCORD_PUBLIC_KEY not set: interactions will be rejected");
                None
            }
        };

        Ok(Self {
            store,
            headshots: Arc::new(headshots),
            snapper: Arc::new(ChromeSnapper::new(cfg.chrome_path.clone())),
            notifier: rest,
            channel,
            verifier,
            events: Arc::new(EventLogger::new(cfg.log_dir.clone())),
            settings: Arc::new(Settings {
                public_base_url: cfg.public_base_url.clone(),
                channel_id: cfg.channel_id.clone(),
                snap_timeout: cfg.snap_timeout,
                headshot_autofetch: cfg.headshot_autofetch,
                headshot_dir: local_dir,
            }),
        })
    }
}

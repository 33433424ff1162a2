/// Futures Tracker — Bet Store
///
/// Nested `sport → category → [bet]` storage with two backends:
/// a locked local JSON file and a Firebase Realtime Database subtree.
/// Buckets are newest-first and capped; every record carries a push-id.

use async_trait::async_trait;
use thiserror::Error;

pub mod book;
pub mod file;
pub mod firebase;
pub mod model;
pub mod push_id;

pub use book::{
    bucket_from_value, keyed_children, match_value_text, BetBook, DeleteMatcher, DEFAULT_BUCKET_CAP,
};
pub use file::JsonFileStore;
pub use firebase::FirebaseStore;
pub use model::{canonical_category, normalize_odds, Bet, NewBet, RawBet, PLAYER_CATEGORIES};
pub use push_id::{next_push_id, PushIdGenerator};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid American odds: {0:?}")]
    InvalidOdds(String),

    #[error("Bucket not found: {sport}/{category}")]
    BucketNotFound { sport: String, category: String },

    #[error("storage config: {0}")]
    Config(String),

    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage upstream HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("storage task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Caller-side problems (bad input, unknown bucket) as opposed to storage failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::MissingFields(_) | StoreError::InvalidOdds(_) | StoreError::BucketNotFound { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub bet: Bet,
    pub evicted: usize,
}

#[async_trait]
pub trait BetStore: Send + Sync {
    /// Whole tree, newest-first per bucket.
    async fn load(&self) -> Result<BetBook, StoreError>;

    /// Prepend to the bet's bucket, evicting the oldest beyond the cap.
    async fn insert(&self, bet: Bet) -> Result<InsertOutcome, StoreError>;

    /// `BucketNotFound` if the bucket does not exist, otherwise the number removed.
    async fn remove(
        &self,
        sport: &str,
        category: &str,
        matcher: &DeleteMatcher,
    ) -> Result<usize, StoreError>;

    fn backend(&self) -> &'static str;
}

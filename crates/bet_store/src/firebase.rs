use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::book::{keyed_children, overflow_ids};
use crate::{Bet, BetBook, BetStore, DeleteMatcher, InsertOutcome, StoreError};

const ROOT: &str = "bets";

/// Firebase Realtime Database over its REST API.
///
/// Layout: `/bets/{sport}/{category}/{pushId}` → bet body without `id`.
/// Every write touches one bucket: a single-child `PUT` for inserts and one
/// multi-path `PATCH` of nulls for evictions and deletes. Buckets imported with a
/// bulk `set` are arrays; their records are addressed by index key.
pub struct FirebaseStore {
    client: Client,
    base: Url,
    auth: Option<String>,
    cap: usize,
}

impl FirebaseStore {
    pub fn new(database_url: &str, auth: Option<String>, cap: usize) -> Result<Self, StoreError> {
        let base = Url::parse(database_url)
            .map_err(|e| StoreError::Config(format!("invalid FIREBASE_DATABASE_URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Config(format!("not a base url: {database_url}")));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self { client, base, auth, cap: cap.max(1) })
    }

    /// `/bets/<segments...>.json` with auth; segments are percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::Config("database url cannot be a base".into()))?;
            path.pop_if_empty();
            let mut all: Vec<&str> = vec![ROOT];
            all.extend_from_slice(segments);
            let last = all.len() - 1;
            for (i, seg) in all.iter().enumerate() {
                if i == last {
                    path.push(&format!("{seg}.json"));
                } else {
                    path.push(seg);
                }
            }
        }
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        Ok(url)
    }

    async fn check(resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Upstream {
            status: status.as_u16(),
            body: body.chars().take(300).collect(),
        })
    }

    async fn get_json(&self, url: Url) -> Result<Value, StoreError> {
        let resp = Self::check(self.client.get(url).send().await?).await?;
        Ok(resp.json::<Value>().await?)
    }

    async fn patch_nulls(&self, sport: &str, category: &str, keys: &[String]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        let body: Map<String, Value> = keys.iter().map(|k| (k.clone(), Value::Null)).collect();
        let url = self.url(&[sport, category])?;
        Self::check(self.client.patch(url).json(&body).send().await?).await?;
        Ok(())
    }

    /// Bucket contents keyed by child key, newest first; `None` when the bucket does not exist.
    async fn read_bucket(&self, sport: &str, category: &str) -> Result<Option<Vec<Bet>>, StoreError> {
        let bucket = self.get_json(self.url(&[sport, category])?).await?;
        if !(bucket.is_object() || bucket.is_array()) {
            return Ok(None);
        }
        Ok(Some(keyed_children(sport, category, bucket)))
    }
}

#[async_trait]
impl BetStore for FirebaseStore {
    async fn load(&self) -> Result<BetBook, StoreError> {
        let root = self.get_json(self.url(&[])?).await?;
        Ok(BetBook::from_rtdb(root))
    }

    async fn insert(&self, bet: Bet) -> Result<InsertOutcome, StoreError> {
        let url = self.url(&[&bet.sport, &bet.category, &bet.id])?;
        Self::check(self.client.put(url).json(&bet.to_child_value()).send().await?).await?;
        debug!(id = %bet.id, "RTDB bet written under {}/{}", bet.sport, bet.category);

        let bucket = self
            .read_bucket(&bet.sport, &bet.category)
            .await?
            .unwrap_or_default();
        let evict = overflow_ids(&bucket, self.cap);
        if !evict.is_empty() {
            info!("RTDB {}/{}: evicting {} oldest bets", bet.sport, bet.category, evict.len());
            self.patch_nulls(&bet.sport, &bet.category, &evict).await?;
        }

        Ok(InsertOutcome { bet, evicted: evict.len() })
    }

    async fn remove(
        &self,
        sport: &str,
        category: &str,
        matcher: &DeleteMatcher,
    ) -> Result<usize, StoreError> {
        let bucket = self
            .read_bucket(sport, category)
            .await?
            .ok_or_else(|| StoreError::BucketNotFound {
                sport: sport.to_string(),
                category: category.to_string(),
            })?;

        let doomed: Vec<String> = bucket
            .into_iter()
            .filter(|b| matcher.matches(b))
            .map(|b| b.id)
            .collect();

        match doomed.as_slice() {
            [] => {}
            [key] => {
                let url = self.url(&[sport, category, key.as_str()])?;
                Self::check(self.client.delete(url).send().await?).await?;
            }
            keys => self.patch_nulls(sport, category, keys).await?,
        }
        Ok(doomed.len())
    }

    fn backend(&self) -> &'static str {
        "firebase"
    }
}

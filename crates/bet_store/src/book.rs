//! In-memory `sport → category → [bet]` structure and the bucket operations both
//! backends share.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{parse_created_at, value_number, Bet, RawBet};
use crate::StoreError;

pub const DEFAULT_BUCKET_CAP: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetBook(pub BTreeMap<String, BTreeMap<String, Vec<Bet>>>);

impl BetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient read of any stored tree. Non-object roots and non-object sports read
    /// as empty; buckets may be arrays (file store) or id-keyed objects (RTDB).
    pub fn from_value(root: Value) -> Self {
        Self::from_tree(root, bucket_from_value)
    }

    /// Read of the RTDB tree, where every record id is its child key.
    pub fn from_rtdb(root: Value) -> Self {
        Self::from_tree(root, keyed_children)
    }

    fn from_tree(root: Value, read_bucket: fn(&str, &str, Value) -> Vec<Bet>) -> Self {
        let mut book = BetBook::new();
        let Value::Object(sports) = root else {
            return book;
        };

        for (sport, categories) in sports {
            let Value::Object(categories) = categories else {
                continue;
            };
            let entry = book.0.entry(sport.clone()).or_default();
            for (category, bucket) in categories {
                entry.insert(category.clone(), read_bucket(&sport, &category, bucket));
            }
        }
        book
    }

    pub fn bucket(&self, sport: &str, category: &str) -> Option<&[Bet]> {
        self.0
            .get(sport)
            .and_then(|c| c.get(category))
            .map(|b| b.as_slice())
    }

    pub fn total(&self) -> usize {
        self.0.values().flat_map(|c| c.values()).map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bet> {
        self.0.values().flat_map(|c| c.values()).flatten()
    }

    /// Prepend to the bet's bucket and evict from the tail beyond `cap`.
    /// Returns the evicted records, oldest last.
    pub fn insert_newest(&mut self, bet: Bet, cap: usize) -> Vec<Bet> {
        let bucket = self
            .0
            .entry(bet.sport.clone())
            .or_default()
            .entry(bet.category.clone())
            .or_default();
        bucket.insert(0, bet);
        if bucket.len() > cap {
            bucket.split_off(cap)
        } else {
            Vec::new()
        }
    }

    pub fn remove_matching(
        &mut self,
        sport: &str,
        category: &str,
        matcher: &DeleteMatcher,
    ) -> Result<usize, StoreError> {
        let bucket = self
            .0
            .get_mut(sport)
            .and_then(|c| c.get_mut(category))
            .ok_or_else(|| StoreError::BucketNotFound {
                sport: sport.to_string(),
                category: category.to_string(),
            })?;

        let before = bucket.len();
        bucket.retain(|b| !matcher.matches(b));
        Ok(before - bucket.len())
    }
}

/// Bucket contents, newest first. Array buckets (the local file layout) get
/// `legacy-*` ids for records saved without one.
pub fn bucket_from_value(sport: &str, category: &str, bucket: Value) -> Vec<Bet> {
    let Value::Array(items) = bucket else {
        return keyed_children(sport, category, bucket);
    };

    let mut bets: Vec<Bet> = items
        .into_iter()
        .enumerate()
        .filter(|(_, v)| v.is_object())
        .filter_map(|(idx, v)| {
            let created = v.get("createdAt").or_else(|| v.get("date")).and_then(parse_created_at);
            let raw: RawBet = serde_json::from_value(v).ok()?;
            let fallback = format!("legacy-{}-{}", created.unwrap_or(0), idx);
            Some(raw.normalize(sport, category, fallback))
        })
        .collect();
    bets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    bets
}

/// RTDB bucket contents, newest first. The id is always the child key: push-ids for
/// object buckets, the index for array buckets written by a bulk `set`. Null holes
/// left by deletes are skipped.
pub fn keyed_children(sport: &str, category: &str, bucket: Value) -> Vec<Bet> {
    let children: Vec<(String, Value)> = match bucket {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, v)| (idx.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };

    let mut bets: Vec<Bet> = children
        .into_iter()
        .filter(|(_, v)| v.is_object())
        .filter_map(|(key, v)| {
            let raw: RawBet = serde_json::from_value(v).ok()?;
            let mut bet = raw.normalize(sport, category, key.clone());
            bet.id = key;
            Some(bet)
        })
        .collect();
    bets.sort_by(newest_first);
    bets
}

/// `createdAt` descending, ties broken by child key descending.
pub fn newest_first(a: &Bet, b: &Bet) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| child_key_cmp(&b.id, &a.id))
}

/// Index keys compare numerically and sort before push-ids; push-ids compare as text,
/// which is chronological.
pub fn child_key_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Ids beyond `cap` in a newest-first bucket, i.e. the oldest records.
pub fn overflow_ids(bucket: &[Bet], cap: usize) -> Vec<String> {
    bucket.iter().skip(cap).map(|b| b.id.clone()).collect()
}

/// How `delete` selects records within a bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteMatcher {
    ById(String),
    /// Every listed field must equal the record's value after normalization.
    /// An empty field set matches nothing.
    ByFields(BTreeMap<String, String>),
}

impl DeleteMatcher {
    pub fn kind(&self) -> &'static str {
        match self {
            DeleteMatcher::ById(_) => "id",
            DeleteMatcher::ByFields(_) => "fields",
        }
    }

    pub fn matches(&self, bet: &Bet) -> bool {
        match self {
            DeleteMatcher::ById(id) => bet.id == *id,
            DeleteMatcher::ByFields(fields) => {
                !fields.is_empty()
                    && fields.iter().all(|(key, want)| {
                        field_text(bet, key).is_some_and(|have| normalize_for(key, &have) == normalize_for(key, want))
                    })
            }
        }
    }
}

/// Record value as text, accepting legacy field names.
fn field_text(bet: &Bet, key: &str) -> Option<String> {
    let text = match key {
        "id" => bet.id.clone(),
        "sport" | "league" => bet.sport.clone(),
        "category" | "type" | "tabLabel" => bet.category.clone(),
        "market" | "subtype" => bet.market.clone(),
        "selection" | "player" | "team" => bet.selection.clone(),
        "odds_american" | "odds" => bet.odds_american.clone(),
        "line" => bet.line.map(|l| l.to_string()).unwrap_or_default(),
        "book" | "site" => bet.book.clone(),
        "notes" => bet.notes.clone(),
        "createdAt" | "date" => bet.created_at.to_string(),
        _ => return None,
    };
    Some(text)
}

fn normalize_for(key: &str, value: &str) -> String {
    let value = value.trim();
    match key {
        "line" => match value_number(&Value::String(value.to_string())) {
            Some(n) => n.to_string(),
            None => value.to_string(),
        },
        "createdAt" | "date" => parse_created_at(&Value::String(value.to_string()))
            .map(|ms| ms.to_string())
            .unwrap_or_else(|| value.to_string()),
        "odds_american" | "odds" => crate::model::normalize_odds(value).unwrap_or_else(|| value.to_string()),
        _ => value.to_string(),
    }
}

/// `null`/absent → `""`, scalars → their text. Used to build field matchers from JSON.
pub fn match_value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

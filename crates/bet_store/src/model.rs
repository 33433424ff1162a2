//! Bet record, create payload, and legacy-schema normalization.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::StoreError;

/// Categories whose `selection` is a player rather than a team.
pub const PLAYER_CATEGORIES: [&str; 3] = ["Awards", "Stat Leaders", "Props"];

/// Bucket names paired with the short tab labels that also name them.
const KNOWN_CATEGORIES: [(&str, &str); 4] = [
    ("Awards", "Awards"),
    ("Team Futures", "Futures"),
    ("Stat Leaders", "Leaders"),
    ("Props", "Props"),
];

/// `team futures`, `LEADERS` → the stored bucket name. Unknown categories are only trimmed.
pub fn canonical_category(raw: &str) -> String {
    let raw = raw.trim();
    KNOWN_CATEGORIES
        .iter()
        .find(|(name, short)| raw.eq_ignore_ascii_case(name) || raw.eq_ignore_ascii_case(short))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    pub sport: String,
    pub category: String,
    #[serde(default)]
    pub market: String,
    pub selection: String,
    pub odds_american: String,
    #[serde(default)]
    pub line: Option<f64>,
    pub book: String,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl Bet {
    pub fn is_player_bet(&self) -> bool {
        PLAYER_CATEGORIES.contains(&self.category.as_str())
    }

    /// RTDB child payload: the id lives in the key, not the body.
    pub fn to_child_value(&self) -> Value {
        let mut v = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(obj) = v.as_object_mut() {
            obj.remove("id");
        }
        v
    }
}

/// Body of `POST /api/bets`. Every field is optional at the serde level so
/// validation can report all missing fields at once.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewBet {
    #[serde(deserialize_with = "opt_text")]
    pub sport: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub category: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub market: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub selection: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub odds_american: Option<String>,
    #[serde(deserialize_with = "opt_number")]
    pub line: Option<f64>,
    #[serde(deserialize_with = "opt_text")]
    pub book: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub notes: Option<String>,
}

impl NewBet {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let required = [
            ("sport", &self.sport),
            ("category", &self.category),
            ("selection", &self.selection),
            ("odds_american", &self.odds_american),
            ("book", &self.book),
        ];
        required
            .iter()
            .filter(|(_, v)| v.as_deref().map_or(true, |s| s.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn into_bet(self, id: String, created_at: i64) -> Result<Bet, StoreError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(StoreError::MissingFields(missing));
        }

        let raw_odds = self.odds_american.unwrap_or_default();
        let odds_american =
            normalize_odds(&raw_odds).ok_or_else(|| StoreError::InvalidOdds(raw_odds.clone()))?;

        Ok(Bet {
            id,
            sport: self.sport.unwrap_or_default().trim().to_uppercase(),
            category: canonical_category(&self.category.unwrap_or_default()),
            market: self.market.unwrap_or_default().trim().to_string(),
            selection: self.selection.unwrap_or_default().trim().to_string(),
            odds_american,
            line: self.line,
            book: self.book.unwrap_or_default().trim().to_string(),
            notes: self.notes.unwrap_or_default().trim().to_string(),
            created_at,
        })
    }
}

/// `+450`, `450`, `-110`, `EVEN` → canonical signed string. Magnitude must be ≥ 100.
pub fn normalize_odds(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("even") || s.eq_ignore_ascii_case("ev") {
        return Some("+100".to_string());
    }
    let digits = s.strip_prefix('+').unwrap_or(s);
    let n: i64 = digits.parse().ok()?;
    if n.abs() < 100 {
        return None;
    }
    Some(if n > 0 { format!("+{n}") } else { n.to_string() })
}

fn opt_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(v.as_ref().and_then(value_text))
}

fn opt_number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(v.as_ref().and_then(value_number))
}

/// Non-empty text of a JSON scalar.
pub(crate) fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn value_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Epoch ms from a number, numeric string, or ISO-8601 string.
pub(crate) fn parse_created_at(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.timestamp_millis())
            })
        }
        _ => None,
    }
}

/// Any historical record shape: local-file (`league`/`tabLabel`/`odds`/`site`/`date`)
/// and RTDB (`sport`/`category`/`odds_american`/`book`/`createdAt`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawBet {
    pub id: Option<Value>,
    pub sport: Option<Value>,
    pub league: Option<Value>,
    pub category: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    #[serde(rename = "tabLabel")]
    pub tab_label: Option<Value>,
    pub market: Option<Value>,
    pub subtype: Option<Value>,
    pub selection: Option<Value>,
    pub player: Option<Value>,
    pub team: Option<Value>,
    pub odds_american: Option<Value>,
    pub odds: Option<Value>,
    pub line: Option<Value>,
    pub book: Option<Value>,
    pub site: Option<Value>,
    pub notes: Option<Value>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<Value>,
    pub date: Option<Value>,
}

fn first_text(candidates: &[&Option<Value>]) -> Option<String> {
    candidates
        .iter()
        .find_map(|v| v.as_ref().and_then(value_text))
}

impl RawBet {
    /// Canonical record. The bucket keys win over in-record sport/category so every
    /// record stays in the bucket it was read from.
    pub fn normalize(self, sport_key: &str, category_key: &str, fallback_id: String) -> Bet {
        let sport = if sport_key.is_empty() {
            first_text(&[&self.sport, &self.league]).unwrap_or_default()
        } else {
            sport_key.to_string()
        };
        let category = if category_key.is_empty() {
            first_text(&[&self.category, &self.kind, &self.tab_label]).unwrap_or_default()
        } else {
            category_key.to_string()
        };

        let created_at = self
            .created_at
            .as_ref()
            .and_then(parse_created_at)
            .or_else(|| self.date.as_ref().and_then(parse_created_at))
            .unwrap_or(0);

        let odds_raw = first_text(&[&self.odds_american, &self.odds]).unwrap_or_default();
        let odds_american = normalize_odds(&odds_raw).unwrap_or(odds_raw);

        Bet {
            id: first_text(&[&self.id]).unwrap_or(fallback_id),
            sport,
            category,
            market: first_text(&[&self.market, &self.subtype]).unwrap_or_default(),
            selection: first_text(&[&self.selection, &self.player, &self.team]).unwrap_or_default(),
            odds_american,
            line: self.line.as_ref().and_then(value_number),
            book: first_text(&[&self.book, &self.site]).unwrap_or_default(),
            notes: first_text(&[&self.notes]).unwrap_or_default(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn odds_are_normalized_to_signed_form() {
        assert_eq!(normalize_odds("+450").as_deref(), Some("+450"));
        assert_eq!(normalize_odds(" 450 ").as_deref(), Some("+450"));
        assert_eq!(normalize_odds("-110").as_deref(), Some("-110"));
        assert_eq!(normalize_odds("even").as_deref(), Some("+100"));
        assert_eq!(normalize_odds("+50"), None);
        assert_eq!(normalize_odds("abc"), None);
        assert_eq!(normalize_odds(""), None);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let nb: NewBet = serde_json::from_value(json!({
            "sport": "NFL",
            "selection": "  ",
            "odds_american": 450
        }))
        .unwrap();
        assert_eq!(nb.missing_fields(), vec!["category", "selection", "book"]);
        match nb.into_bet("x".into(), 1) {
            Err(StoreError::MissingFields(f)) => assert_eq!(f.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn numeric_inputs_are_accepted_as_text() {
        let nb: NewBet = serde_json::from_value(json!({
            "sport": "nfl",
            "category": "Props",
            "selection": "Josh Allen",
            "odds_american": -115,
            "line": "27.5",
            "book": "DK"
        }))
        .unwrap();
        let bet = nb.into_bet("id1".into(), 42).unwrap();
        assert_eq!(bet.sport, "NFL");
        assert_eq!(bet.odds_american, "-115");
        assert_eq!(bet.line, Some(27.5));
        assert_eq!(bet.market, "");
        assert_eq!(bet.created_at, 42);
    }

    #[test]
    fn category_case_folds_to_bucket_name() {
        let nb: NewBet = serde_json::from_value(json!({
            "sport": "nba", "category": " stat leaders ", "selection": "Jokic",
            "odds_american": "+900", "book": "DK"
        }))
        .unwrap();
        let bet = nb.into_bet("i".into(), 0).unwrap();
        assert_eq!(bet.category, "Stat Leaders");
        assert!(bet.is_player_bet());

        assert_eq!(canonical_category("FUTURES"), "Team Futures");
        assert_eq!(canonical_category("awards"), "Awards");
        assert_eq!(canonical_category(" Rookie Watch "), "Rookie Watch");
    }

    #[test]
    fn invalid_odds_are_rejected() {
        let nb: NewBet = serde_json::from_value(json!({
            "sport": "NFL", "category": "Awards", "selection": "A",
            "odds_american": "+4x0", "book": "FD"
        }))
        .unwrap();
        assert!(matches!(nb.into_bet("i".into(), 0), Err(StoreError::InvalidOdds(_))));
    }

    #[test]
    fn legacy_file_record_is_normalized() {
        let raw: RawBet = serde_json::from_value(json!({
            "type": "Awards",
            "tabLabel": "MVP",
            "player": "Patrick Mahomes",
            "team": "Chiefs",
            "odds": "450",
            "site": "FD",
            "league": "NFL",
            "date": "2025-08-01T12:00:00.000Z"
        }))
        .unwrap();
        let bet = raw.normalize("NFL", "MVP", "legacy-0".into());
        assert_eq!(bet.id, "legacy-0");
        assert_eq!(bet.category, "MVP");
        assert_eq!(bet.selection, "Patrick Mahomes");
        assert_eq!(bet.odds_american, "+450");
        assert_eq!(bet.book, "FD");
        assert_eq!(bet.created_at, 1_754_049_600_000);
    }

    #[test]
    fn rtdb_record_keeps_its_fields() {
        let raw: RawBet = serde_json::from_value(json!({
            "sport": "NBA", "category": "Team Futures", "market": "Title",
            "selection": "Celtics", "odds_american": "+300", "line": null,
            "book": "DK", "notes": "", "createdAt": "1700000000000"
        }))
        .unwrap();
        let bet = raw.normalize("", "", "-Nabc".into());
        assert_eq!(bet.sport, "NBA");
        assert_eq!(bet.category, "Team Futures");
        assert_eq!(bet.market, "Title");
        assert_eq!(bet.line, None);
        assert_eq!(bet.created_at, 1_700_000_000_000);
    }

    #[test]
    fn child_value_omits_id() {
        let bet = Bet {
            id: "-Nxyz".into(),
            sport: "NFL".into(),
            category: "Awards".into(),
            market: String::new(),
            selection: "A".into(),
            odds_american: "+100".into(),
            line: None,
            book: "FD".into(),
            notes: String::new(),
            created_at: 5,
        };
        let v = bet.to_child_value();
        assert!(v.get("id").is_none());
        assert_eq!(v["createdAt"], 5);
    }
}

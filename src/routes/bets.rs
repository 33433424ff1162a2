use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bet_store::{canonical_category, match_value_text, next_push_id, Bet, DeleteMatcher, NewBet, StoreError};
use chrono::Utc;
use logger::{now_iso, BetCreatedEvent, BetDeletedEvent};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::AppError;
use crate::routes::headshots::spawn_headshot_fetch;
use crate::state::AppState;

/// Body keys a legacy client may send to identify a record without an id.
const MATCH_FIELDS: [&str; 13] = [
    "createdAt",
    "date",
    "selection",
    "player",
    "team",
    "odds_american",
    "odds",
    "book",
    "site",
    "market",
    "subtype",
    "line",
    "notes",
];

pub async fn list_bets(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let book = state.store.load().await?;
    debug!("listing {} bets", book.total());
    Ok(Json(book))
}

pub async fn create_bet(
    State(state): State<AppState>,
    Json(payload): Json<NewBet>,
) -> Result<impl IntoResponse, AppError> {
    let bet = payload.into_bet(next_push_id(), Utc::now().timestamp_millis())?;
    let outcome = state.store.insert(bet).await?;
    let bet = outcome.bet;

    info!(
        "➕ bet {} {}/{}: {} {} @ {}",
        bet.id, bet.sport, bet.category, bet.selection, bet.odds_american, bet.book
    );
    state.events.emit(&BetCreatedEvent {
        ts: now_iso(),
        event: "BET_CREATED",
        id: bet.id.clone(),
        sport: bet.sport.clone(),
        category: bet.category.clone(),
        selection: bet.selection.clone(),
        odds_american: bet.odds_american.clone(),
        book: bet.book.clone(),
        evicted: outcome.evicted,
    });

    if state.settings.headshot_autofetch && bet.is_player_bet() {
        spawn_headshot_fetch(&state, bet.selection.clone());
    }

    Ok((StatusCode::CREATED, Json::<Bet>(bet)))
}

fn text_field(body: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| body.get(*k))
        .map(match_value_text)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Field matcher from a legacy delete body. `team` is ignored when `player` is present
/// because legacy records carry both and only the player became the selection.
fn field_matcher(body: &Map<String, Value>) -> BTreeMap<String, String> {
    let has_player = text_field(body, &["player"]).is_some();
    MATCH_FIELDS
        .iter()
        .filter(|k| !(has_player && **k == "team"))
        .filter_map(|k| body.get(*k).map(|v| (k.to_string(), match_value_text(v))))
        .collect()
}

/// Both delete routes address buckets the way inserts name them.
fn bucket_address(sport: &str, category: &str) -> (String, String) {
    (sport.trim().to_uppercase(), canonical_category(category))
}

async fn remove_and_respond(
    state: &AppState,
    sport: &str,
    category: &str,
    matcher: DeleteMatcher,
) -> Result<Response, AppError> {
    let removed = match state.store.remove(sport, category, &matcher).await {
        Ok(n) => n,
        Err(StoreError::BucketNotFound { .. }) => {
            return Ok((
                StatusCode::NOT_FOUND,
                Json(json!({ "ok": false, "removed": 0, "error": "Bucket not found" })),
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    state.events.emit(&BetDeletedEvent {
        ts: now_iso(),
        event: "BET_DELETED",
        sport: sport.to_string(),
        category: category.to_string(),
        matcher: matcher.kind().to_string(),
        removed,
    });

    if removed == 0 {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "ok": false, "removed": 0, "error": "Bet not found" })),
        )
            .into_response());
    }

    info!("➖ removed {} bet(s) from {}/{} by {}", removed, sport, category, matcher.kind());
    Ok(Json(json!({ "ok": true, "removed": removed })).into_response())
}

pub async fn delete_bet(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Response, AppError> {
    let sport = text_field(&body, &["sport", "league"]);
    let category = text_field(&body, &["category", "tabLabel", "type"]);
    let (Some(sport), Some(category)) = (sport, category) else {
        return Err(AppError::BadRequest("Missing required fields: sport, category".into()));
    };
    let (sport, category) = bucket_address(&sport, &category);

    let matcher = match text_field(&body, &["id"]) {
        Some(id) => DeleteMatcher::ById(id),
        None => {
            let fields = field_matcher(&body);
            if fields.is_empty() {
                return Err(AppError::BadRequest("Provide an id or at least one match field".into()));
            }
            DeleteMatcher::ByFields(fields)
        }
    };

    remove_and_respond(&state, &sport, &category, matcher).await
}

pub async fn delete_bet_by_id(
    State(state): State<AppState>,
    Path((sport, category, id)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let (sport, category) = bucket_address(&sport, &category);
    remove_and_respond(&state, &sport, &category, DeleteMatcher::ById(id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_body_prefers_player_over_team() {
        let body: Map<String, Value> = serde_json::from_value(json!({
            "league": "NFL",
            "tabLabel": "MVP",
            "date": "2025-08-01T00:00:00.000Z",
            "player": "Joe Burrow",
            "team": "Bengals",
            "odds": "+800",
            "site": "FD",
            "image": "ignored"
        }))
        .unwrap();

        let fields = field_matcher(&body);
        assert!(!fields.contains_key("team"));
        assert!(!fields.contains_key("image"));
        assert_eq!(fields["player"], "Joe Burrow");
        assert_eq!(text_field(&body, &["sport", "league"]).as_deref(), Some("NFL"));
    }

    #[test]
    fn type_names_the_bucket_when_nothing_else_does() {
        let body: Map<String, Value> =
            serde_json::from_value(json!({"league": "nfl", "type": "team futures", "id": "-N1"}))
                .unwrap();
        let sport = text_field(&body, &["sport", "league"]).unwrap();
        let category = text_field(&body, &["category", "tabLabel", "type"]).unwrap();
        assert_eq!(
            bucket_address(&sport, &category),
            ("NFL".to_string(), "Team Futures".to_string())
        );
        assert_eq!(
            bucket_address(" nba ", "Leaders"),
            ("NBA".to_string(), "Stat Leaders".to_string())
        );
        assert_eq!(bucket_address("NFL", "MVP").1, "MVP");
    }

    #[test]
    fn null_fields_match_as_empty() {
        let body: Map<String, Value> =
            serde_json::from_value(json!({"notes": null, "line": 27.5})).unwrap();
        let fields = field_matcher(&body);
        assert_eq!(fields["notes"], "");
        assert_eq!(fields["line"], "27.5");
    }
}

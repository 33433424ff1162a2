use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use logger::{now_iso, HeadshotLookupEvent};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HeadshotRequest {
    #[serde(default)]
    pub name: Option<String>,
}

fn emit_lookup(state: &AppState, name: &str, found: Option<&headshots::HeadshotResult>) {
    state.events.emit(&HeadshotLookupEvent {
        ts: now_iso(),
        event: "HEADSHOT_LOOKUP",
        name: name.to_string(),
        found: found.is_some(),
        cached: found.map(|r| r.cached).unwrap_or(false),
        url: found.map(|r| r.url.clone()),
    });
}

/// Background lookup after a player bet is saved; the result only lands in the cache.
pub fn spawn_headshot_fetch(state: &AppState, name: String) {
    let state = state.clone();
    tokio::spawn(async move {
        let result = state.headshots.fetch(&name).await;
        debug!("auto headshot for {}: {:?}", name, result);
        emit_lookup(&state, &name, result.as_ref());
    });
}

pub async fn fetch_headshot(
    State(state): State<AppState>,
    Json(req): Json<HeadshotRequest>,
) -> impl IntoResponse {
    let Some(name) = req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Missing name" })),
        );
    };

    let result = state.headshots.fetch(&name).await;
    emit_lookup(&state, &name, result.as_ref());

    match result {
        Some(found) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "url": found.url, "cached": found.cached })),
        ),
        None => (StatusCode::NOT_FOUND, Json(json!({ "ok": false, "url": null }))),
    }
}

/// Whole name → URL mapping.
pub async fn list_headshots(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let all = state.headshots.cache().all()?;
    Ok(Json(all))
}

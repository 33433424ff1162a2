use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use logger::{now_iso, SnapEvent};
use serde_json::json;
use snapper::{capture_with_deadline, SnapError, SnapParams};
use tracing::{info, warn};

use crate::state::AppState;

fn snap_error_response(err: &SnapError) -> Response {
    match err {
        SnapError::MissingUrl => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing_url" }))).into_response()
        }
        SnapError::InvalidUrl(detail) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_url", "details": detail })),
        )
            .into_response(),
        SnapError::Timeout(_) => {
            (StatusCode::GATEWAY_TIMEOUT, Json(json!({ "error": "snap_timeout" }))).into_response()
        }
        SnapError::Failed(detail) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "snap_failed", "details": detail })),
        )
            .into_response(),
    }
}

pub async fn snap(State(state): State<AppState>, Query(params): Query<SnapParams>) -> Response {
    let req = match params.into_request() {
        Ok(req) => req,
        Err(e) => return snap_error_response(&e),
    };

    let started = Instant::now();
    let result = capture_with_deadline(state.snapper.as_ref(), &req, state.settings.snap_timeout).await;

    state.events.emit(&SnapEvent {
        ts: now_iso(),
        event: "SNAP",
        url: req.url.clone(),
        selector: req.selector.clone(),
        ok: result.is_ok(),
        bytes: result.as_ref().map(|png| png.len()).unwrap_or(0),
        elapsed_ms: started.elapsed().as_millis(),
        error: result.as_ref().err().map(|e| e.to_string()),
    });

    match result {
        Ok(png) => {
            info!("📷 snap {} ({} bytes, {:?})", req.url, png.len(), started.elapsed());
            (
                [
                    (header::CONTENT_TYPE, "image/png"),
                    (header::CACHE_CONTROL, "public, max-age=60"),
                ],
                png,
            )
                .into_response()
        }
        Err(e) => {
            warn!("snap {} failed: {}", req.url, e);
            snap_error_response(&e)
        }
    }
}

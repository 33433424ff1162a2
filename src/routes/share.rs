use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use discord::{ChannelPoster, FUTURES_FILENAME};
use logger::{now_iso, DiscordDeliveryEvent};
use serde::Deserialize;
use serde_json::json;
use snapper::{capture_with_deadline, SnapRequest};
use tracing::info;

use crate::error::AppError;
use crate::naming::{View, ALL};
use crate::page::absolute_page_url;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ShareRequest {
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub image: Option<String>,
}

fn channel_target(state: &AppState) -> Result<(Arc<dyn ChannelPoster>, String), AppError> {
    let channel = state
        .channel
        .clone()
        .ok_or_else(|| AppError::Internal("DISCORD_TOKEN is not configured".into()))?;
    let channel_id = state
        .settings
        .channel_id
        .clone()
        .ok_or_else(|| AppError::Internal("CHANNEL_ID is not configured".into()))?;
    Ok((channel, channel_id))
}

async fn post_to_channel(state: &AppState, png: Vec<u8>, filename: &str) -> Result<(), AppError> {
    let (channel, channel_id) = channel_target(state)?;
    let bytes = png.len();
    let result = channel.post_png(&channel_id, png, filename).await;

    state.events.emit(&DiscordDeliveryEvent {
        ts: now_iso(),
        event: "DISCORD_DELIVERY",
        target: "channel".to_string(),
        ok: result.is_ok(),
        detail: match &result {
            Ok(()) => format!("{filename} {bytes} bytes"),
            Err(e) => format!("{e:#}"),
        },
    });

    result.map_err(AppError::from)?;
    info!("📤 posted {} ({} bytes) to channel {}", filename, bytes, channel_id);
    Ok(())
}

/// Screenshot the futures view and post it to the configured channel.
pub async fn share(
    State(state): State<AppState>,
    Json(req): Json<ShareRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = View::new(
        req.sport.as_deref().unwrap_or("NFL"),
        req.category.as_deref().unwrap_or(ALL),
        req.market.as_deref().unwrap_or_default(),
    );
    let base = state
        .settings
        .public_base_url
        .clone()
        .ok_or_else(|| AppError::Internal("PUBLIC_BASE_URL is not configured".into()))?;

    let snap = SnapRequest::new(absolute_page_url(&base, &view)).with_selector(view.modal_selector());
    let png = capture_with_deadline(state.snapper.as_ref(), &snap, state.settings.snap_timeout).await?;
    post_to_channel(&state, png, FUTURES_FILENAME).await?;

    Ok(Json(json!({ "ok": true })))
}

/// Strip an optional `data:image/...;base64,` prefix and decode.
pub fn decode_image_payload(raw: &str) -> Option<Vec<u8>> {
    let raw = raw.trim();
    let payload = match raw.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data)?,
        None => raw,
    };
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    (!bytes.is_empty()).then_some(bytes)
}

pub async fn upload_image(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let png = req
        .image
        .as_deref()
        .and_then(decode_image_payload)
        .ok_or_else(|| AppError::BadRequest("Missing or invalid image".into()))?;

    post_to_channel(&state, png, "image.png").await?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_prefix_is_stripped() {
        let encoded = STANDARD.encode(b"\x89PNG fake");
        assert_eq!(
            decode_image_payload(&format!("data:image/png;base64,{encoded}")).as_deref(),
            Some(&b"\x89PNG fake"[..])
        );
        assert_eq!(decode_image_payload(&encoded).as_deref(), Some(&b"\x89PNG fake"[..]));
    }

    #[test]
    fn empty_or_garbage_is_rejected() {
        assert!(decode_image_payload("").is_none());
        assert!(decode_image_payload("data:image/png;base64,").is_none());
        assert!(decode_image_payload("not base64 !!").is_none());
    }
}

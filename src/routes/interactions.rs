use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use discord::{
    interaction::{INTERACTION_APPLICATION_COMMAND, INTERACTION_PING},
    Interaction, InteractionResponse, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use logger::{now_iso, DiscordDeliveryEvent, InteractionEvent};
use snapper::{capture_with_deadline, SnapRequest};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::naming::{View, ALL};
use crate::page::absolute_page_url;
use crate::state::AppState;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let Some(verifier) = state.verifier.as_ref() else {
        warn!("interaction rejected: no public key configured");
        return Err(AppError::Unauthorized("Bad request signature".into()));
    };
    if let Err(e) = verifier.verify(
        header_str(&headers, SIGNATURE_HEADER),
        header_str(&headers, TIMESTAMP_HEADER),
        &body,
    ) {
        warn!("interaction rejected: {}", e);
        return Err(AppError::Unauthorized("Bad request signature".into()));
    }

    let interaction: Interaction = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid interaction body: {e}")))?;

    let kind = interaction.kind;
    let command = interaction.data.as_ref().map(|_| interaction.command_name());
    let response = match kind {
        INTERACTION_PING => InteractionResponse::pong(),
        INTERACTION_APPLICATION_COMMAND => match interaction.command_name().as_str() {
            "ping" => InteractionResponse::message("🏓 Pong"),
            "futures" => {
                let job_state = state.clone();
                tokio::spawn(async move { run_futures_job(job_state, interaction).await });
                InteractionResponse::deferred()
            }
            other => InteractionResponse::message(format!("🤔 Unknown command: `{other}`")),
        },
        _ => InteractionResponse::message("Unhandled."),
    };

    state.events.emit(&InteractionEvent {
        ts: now_iso(),
        event: "INTERACTION",
        kind,
        command,
        response: response.kind,
    });

    Ok(Json(response))
}

/// Capture the requested view and return the PNG, or the reason it could not be made.
async fn render_view_png(state: &AppState, view: &View) -> Result<Vec<u8>, String> {
    let base = state
        .settings
        .public_base_url
        .as_deref()
        .ok_or_else(|| "PUBLIC_BASE_URL is not configured".to_string())?;

    let req = SnapRequest::new(absolute_page_url(base, view)).with_selector(view.modal_selector());
    capture_with_deadline(state.snapper.as_ref(), &req, state.settings.snap_timeout)
        .await
        .map_err(|e| e.to_string())
}

/// Completes a deferred `futures` command. Ends with exactly one edit of the original
/// message: the PNG, or a failure notice.
pub async fn run_futures_job(state: AppState, interaction: Interaction) {
    let view = View::new(
        &interaction.option_or("sport", "NFL"),
        &interaction.option_or("category", ALL),
        &interaction.option_str("market").unwrap_or_default(),
    );
    let app = interaction.application_id.as_str();
    let token = interaction.token.as_str();
    info!(
        "🖼️ futures job {}/{} market={:?} channel={:?}",
        view.sport, view.category, view.market, interaction.channel_id
    );

    let outcome = match render_view_png(&state, &view).await {
        Ok(png) => {
            let bytes = png.len();
            state
                .notifier
                .edit_original_png(app, token, png)
                .await
                .map(|_| format!("png {bytes} bytes"))
                .map_err(|e| format!("{e:#}"))
        }
        Err(reason) => Err(reason),
    };

    let (ok, detail) = match outcome {
        Ok(detail) => (true, detail),
        Err(reason) => {
            warn!("futures job failed: {}", reason);
            let content = format!("❌ Failed to generate screenshot. {reason}");
            match state.notifier.edit_original_text(app, token, &content).await {
                Ok(()) => (false, reason),
                Err(e) => {
                    error!("could not report futures failure to Discord: {:#}", e);
                    (false, format!("{reason}; notice failed: {e:#}"))
                }
            }
        }
    };

    state.events.emit(&DiscordDeliveryEvent {
        ts: now_iso(),
        event: "DISCORD_DELIVERY",
        target: "interaction".to_string(),
        ok,
        detail,
    });
}

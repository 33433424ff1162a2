use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
};
use tracing::warn;

use crate::error::AppError;
use crate::naming::ViewQuery;
use crate::page::render_futures_page;
use crate::state::AppState;

pub async fn index() -> Redirect {
    Redirect::temporary("/futures")
}

pub async fn futures_page(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let view = query.view();
    let book = state.store.load().await?;
    let headshots = state.headshots.cache().all().unwrap_or_else(|e| {
        warn!("headshot cache unavailable, rendering without images: {:#}", e);
        Default::default()
    });
    Ok(Html(render_futures_page(&view, &book, &headshots)))
}

pub async fn health() -> &'static str {
    "ok"
}

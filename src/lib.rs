/// Futures Tracker — HTTP service
///
/// Bet API, headshot lookups, page screenshots, Discord interactions, and the
/// server-rendered futures page, all on one axum router.

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

pub mod config;
pub mod error;
pub mod logos;
pub mod naming;
pub mod page;
pub mod routes;
pub mod state;

use routes::{bets, headshots, interactions, pages, share, snap};
use state::{AppState, HEADSHOT_ROUTE};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let mut app = Router::new()
        .route("/", get(pages::index))
        .route("/futures", get(pages::futures_page))
        .route("/health", get(pages::health))
        .route("/api/bets", get(bets::list_bets).post(bets::create_bet))
        .route("/api/bets/delete", post(bets::delete_bet))
        .route("/api/bets/{sport}/{category}/{id}", delete(bets::delete_bet_by_id))
        .route("/api/bets/headshots/fetch", post(headshots::fetch_headshot))
        .route("/api/headshots", get(headshots::list_headshots))
        .route("/api/snap", get(snap::snap))
        .route("/api/interactions", post(interactions::interactions))
        .route("/api/share", post(share::share))
        .route("/api/upload-image", post(share::upload_image));

    if let Some(dir) = state.settings.headshot_dir.clone() {
        app = app.nest_service(HEADSHOT_ROUTE, ServeDir::new(dir));
    }

    app.layer(cors).layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

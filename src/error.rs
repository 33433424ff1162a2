use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bet_store::StoreError;
use serde_json::json;
use snapper::SnapError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MissingFields(_) | StoreError::InvalidOdds(_) => AppError::BadRequest(e.to_string()),
            StoreError::BucketNotFound { .. } => AppError::NotFound(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<SnapError> for AppError {
    fn from(e: SnapError) -> Self {
        match e {
            SnapError::MissingUrl | SnapError::InvalidUrl(_) => AppError::BadRequest(e.to_string()),
            SnapError::Timeout(_) => AppError::Timeout(e.to_string()),
            SnapError::Failed(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Internal(detail) => {
                error!("request failed: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

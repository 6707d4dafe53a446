use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use checker::CheckError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl From<CheckError> for ApiError {
    fn from(e: CheckError) -> Self {
        match e {
            CheckError::EmptyKey | CheckError::EmptyInput => ApiError::BadRequest(e.to_string()),
            CheckError::Client(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl From<CheckError> for StartupError {
    fn from(e: CheckError) -> Self {
        error!(error = %e, "cannot build key validator");
        StartupError::InvalidConfig(e.to_string())
    }
}

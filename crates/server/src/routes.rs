use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use checker::{report, BatchChecker, GeminiValidator, KeyReport, Outcome, Tally};
use common::types::Health;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub checker: BatchChecker<GeminiValidator>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub label: String,
    pub outcome: Outcome,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Newline or comma separated keys.
    #[serde(default)]
    pub keys: String,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub count: usize,
    pub results: Vec<KeyReport>,
    pub report: String,
    pub tally: Tally,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    match checker::observability::encode_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}")),
    }
}

async fn check_key(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let outcome = state.checker.check_one(&req.key).await?;
    Ok(Json(CheckResponse {
        label: checker::mask_key(&req.key),
        message: outcome.to_string(),
        outcome,
    }))
}

async fn check_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let results = state.checker.check_all(&req.keys).await?;
    Ok(Json(BatchResponse {
        count: results.len(),
        report: report::render_batch(&results),
        tally: Tally::from_reports(&results),
        results,
    }))
}

/// Build the application router: health, metrics and the two check endpoints.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR));

    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    let api = Router::new()
        .route("/api/check", post(check_key))
        .route("/api/check/batch", post(check_batch));

    public
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(trace)
}

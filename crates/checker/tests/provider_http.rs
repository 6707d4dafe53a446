use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use checker::{BatchChecker, CheckError, GeminiValidator, KeyCheck, Outcome};
use configs::AuthScheme;
use serde_json::json;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Provider {
    hits: Arc<AtomicUsize>,
}

/// Pull the key out of whichever convention the client used.
fn presented_key(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
    if let Some(k) = query.get("key") {
        return Some(k.clone());
    }
    if let Some(k) = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) {
        return Some(k.to_string());
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn list_models(
    State(p): State<Provider>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    p.hits.fetch_add(1, Ordering::SeqCst);
    let accept_json = headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "application/json")
        .unwrap_or(false);
    if !accept_json {
        return (StatusCode::NOT_ACCEPTABLE, Json(json!({}))).into_response();
    }
    match presented_key(&headers, &query).as_deref() {
        Some("key1") | Some("AIzaSyGOODGOODGOODGOOD") => {
            (StatusCode::OK, Json(json!({"models": [{"name": "models/gemini-2.5-flash"}]}))).into_response()
        }
        Some("key2") => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": 401, "message": "API key not valid.", "status": "UNAUTHENTICATED"}})),
        )
            .into_response(),
        Some("key3") => (StatusCode::SERVICE_UNAVAILABLE, "upstream busy").into_response(),
        Some("quota") => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}})),
        )
            .into_response(),
        Some("slow") => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK.into_response()
        }
        Some(_) => (StatusCode::FORBIDDEN, Json(json!({"error": {"code": 403}}))).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn start_provider() -> anyhow::Result<(String, Provider)> {
    let provider = Provider::default();
    let app = Router::new()
        .route("/v1/models", get(list_models))
        .with_state(provider.clone());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("provider error: {}", e); }
    });
    Ok((format!("http://{}:{}/v1/models", addr.ip(), addr.port()), provider))
}

fn validator(endpoint: &str, auth: AuthScheme) -> GeminiValidator {
    GeminiValidator::new(endpoint, auth, Duration::from_secs(2), Duration::from_secs(2))
        .expect("build validator")
}

#[tokio::test]
async fn status_200_is_valid_for_every_auth_scheme() -> anyhow::Result<()> {
    let (endpoint, provider) = start_provider().await?;
    for auth in [AuthScheme::Bearer, AuthScheme::Query, AuthScheme::Header] {
        assert_eq!(validator(&endpoint, auth).check("key1").await, Outcome::Valid, "{auth}");
    }
    assert_eq!(provider.hits.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn status_401_is_invalid() -> anyhow::Result<()> {
    let (endpoint, _) = start_provider().await?;
    assert_eq!(validator(&endpoint, AuthScheme::Query).check("key2").await, Outcome::Invalid);
    Ok(())
}

#[tokio::test]
async fn status_429_is_ambiguous_with_code() -> anyhow::Result<()> {
    let (endpoint, _) = start_provider().await?;
    let outcome = validator(&endpoint, AuthScheme::Bearer).check("quota").await;
    assert_eq!(outcome, Outcome::Ambiguous(429));
    assert!(outcome.to_string().contains("429"));
    Ok(())
}

#[tokio::test]
async fn one_request_per_check() -> anyhow::Result<()> {
    let (endpoint, provider) = start_provider().await?;
    let v = validator(&endpoint, AuthScheme::Header);
    let _ = v.check("key3").await;
    assert_eq!(provider.hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn connection_refused_is_transport_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let endpoint = format!("http://{}/v1/models", addr);
    let outcome = validator(&endpoint, AuthScheme::Query).check("AIzaSySECRETSECRETSECRET").await;
    match outcome {
        Outcome::TransportError(msg) => {
            assert!(!msg.is_empty());
            assert!(!msg.contains("AIzaSySECRETSECRETSECRET"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn hung_request_times_out_as_transport_error() -> anyhow::Result<()> {
    let (endpoint, _) = start_provider().await?;
    let v = GeminiValidator::new(&endpoint, AuthScheme::Query, Duration::from_secs(1), Duration::from_millis(300))?;
    assert_eq!(v.check("slow").await, Outcome::TransportError("request timed out".into()));
    Ok(())
}

#[tokio::test]
async fn batch_mixes_statuses_in_input_order() -> anyhow::Result<()> {
    let (endpoint, provider) = start_provider().await?;
    let checker = BatchChecker::new(validator(&endpoint, AuthScheme::Query));

    let reports = checker.check_all("key1,key2\nkey3").await?;
    let outcomes: Vec<_> = reports.iter().map(|r| r.outcome.clone()).collect();
    assert_eq!(outcomes, vec![Outcome::Valid, Outcome::Invalid, Outcome::Ambiguous(503)]);
    assert_eq!(provider.hits.load(Ordering::SeqCst), 3);

    let text = checker::report::render_batch(&reports);
    assert!(text.contains("Valid (200)"));
    assert!(text.contains("Invalid (401)"));
    assert!(text.contains("Maybe restricted (503)"));
    Ok(())
}

#[tokio::test]
async fn batch_completes_when_provider_unreachable() -> anyhow::Result<()> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let checker = BatchChecker::new(validator(&format!("http://{}/v1/models", addr), AuthScheme::Bearer));
    let reports = checker.check_all("AIzaSyGOODGOODGOODGOOD\nkey2").await?;
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| matches!(r.outcome, Outcome::TransportError(_))));
    assert_eq!(reports[0].label, "AIzaSy…GOOD");
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_an_input_error_without_requests() -> anyhow::Result<()> {
    let (endpoint, provider) = start_provider().await?;
    let checker = BatchChecker::new(validator(&endpoint, AuthScheme::Query));
    assert!(matches!(checker.check_all("\n , \n").await, Err(CheckError::EmptyInput)));
    assert!(matches!(checker.check_one("").await, Err(CheckError::EmptyKey)));
    assert_eq!(provider.hits.load(Ordering::SeqCst), 0);
    Ok(())
}

use std::error::Error as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use configs::{AuthScheme, CheckerConfig};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::keys::mask_key;
use crate::observability;
use crate::outcome::Outcome;
use crate::CheckError;

const GOOG_API_KEY_HEADER: &str = "x-goog-api-key";

/// Classifies one candidate key.
///
/// Implementations must not fail: every error path resolves to an [`Outcome`].
/// The key is expected to be trimmed and non-empty.
#[async_trait]
pub trait KeyCheck: Send + Sync {
    async fn check(&self, key: &str) -> Outcome;
}

/// Checks keys against the Gemini model-listing endpoint.
#[derive(Debug, Clone)]
pub struct GeminiValidator {
    client: Client,
    endpoint: String,
    auth: AuthScheme,
}

/// Google error envelope, e.g. `{"error":{"code":400,"message":"...","status":"INVALID_ARGUMENT"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiValidator {
    pub fn new(
        endpoint: impl Into<String>,
        auth: AuthScheme,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, CheckError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| CheckError::Client(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into(), auth })
    }

    pub fn from_config(cfg: &CheckerConfig) -> Result<Self, CheckError> {
        Self::new(cfg.endpoint.clone(), cfg.auth, cfg.connect_timeout(), cfg.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn auth(&self) -> AuthScheme {
        self.auth
    }

    fn request(&self, key: &str) -> RequestBuilder {
        let req = self.client.get(&self.endpoint).header(ACCEPT, "application/json");
        match self.auth {
            AuthScheme::Bearer => req.header(AUTHORIZATION, format!("Bearer {key}")),
            AuthScheme::Query => req.query(&[("key", key)]),
            AuthScheme::Header => req.header(GOOG_API_KEY_HEADER, key),
        }
    }
}

#[async_trait]
impl KeyCheck for GeminiValidator {
    async fn check(&self, key: &str) -> Outcome {
        let label = mask_key(key);
        let started = Instant::now();

        let outcome = match self.request(key).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let outcome = Outcome::from_status(status);
                if !outcome.is_valid() {
                    log_error_body(&label, resp).await;
                }
                outcome
            }
            Err(e) => {
                let message = describe_transport_error(e);
                warn!(key = %label, error = %message, "key check did not complete");
                Outcome::TransportError(message)
            }
        };

        let elapsed = started.elapsed();
        observability::record(&outcome, elapsed.as_secs_f64());
        info!(
            key = %label,
            outcome = outcome.kind(),
            status = outcome.status(),
            elapsed_ms = elapsed_millis(elapsed),
            "key checked"
        );
        outcome
    }
}

fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

async fn log_error_body(label: &str, resp: reqwest::Response) {
    match resp.json::<ErrorEnvelope>().await {
        Ok(env) => debug!(
            key = %label,
            code = env.error.code,
            status = env.error.status.as_deref().unwrap_or_default(),
            message = env.error.message.as_deref().unwrap_or_default(),
            "provider error body"
        ),
        Err(e) => debug!(key = %label, error = %e, "unparsed provider error body"),
    }
}

/// Render a reqwest failure with its source chain.
///
/// The URL is stripped first: with query authentication it carries the key.
fn describe_transport_error(e: reqwest::Error) -> String {
    let e = e.without_url();
    if e.is_timeout() {
        return "request timed out".to_string();
    }
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

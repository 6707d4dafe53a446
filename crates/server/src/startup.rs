use std::future::Future;
use std::{env, net::SocketAddr};

use axum::Router;
use checker::{BatchChecker, GeminiValidator};
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Bind address from config, with `SERVER_HOST`/`SERVER_PORT` taking precedence.
fn load_bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    let host = env::var("SERVER_HOST").unwrap_or_else(|_| cfg.server.host.clone());
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(cfg.server.port);
    Ok(format!("{}:{}", host, port).parse()?)
}

pub fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let validator = GeminiValidator::from_config(&cfg.checker)?;
    Ok(AppState { checker: BatchChecker::new(validator) })
}

/// Serve `app` until `shutdown` resolves, letting in-flight requests finish.
pub async fn serve_until<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: build the app from an already loaded config and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg)?;
    let validator = state.checker.validator();
    info!(
        endpoint = %validator.endpoint(),
        auth = %validator.auth(),
        "key validator ready"
    );
    let app = routes::build_router(state, build_cors());

    let addr = load_bind_addr(&cfg)?;
    info!(%addr, "starting key check server");
    let listener = TcpListener::bind(addr).await?;
    serve_until(listener, app, shutdown_signal()).await
}

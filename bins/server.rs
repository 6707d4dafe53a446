use std::process::ExitCode;

use common::utils::logging::{init_logging, LogFormat};
use configs::AppConfig;
use dotenvy::dotenv;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};
use uuid::Uuid;

const EXIT_CONFIG: u8 = 2;

/// `TOKIO_WORKER_THREADS` wins over `server.worker_threads`.
fn worker_threads(cfg: &AppConfig) -> Option<usize> {
    std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|w| *w > 0)
        .or(cfg.server.worker_threads)
}

fn build_runtime(threads: Option<usize>) -> std::io::Result<Runtime> {
    let mut builder = Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = threads {
        builder.worker_threads(w);
    }
    builder.build()
}

fn main() -> ExitCode {
    // .env first so RUST_LOG and LOG_FORMAT take effect
    dotenv().ok();
    init_logging(LogFormat::from_env());

    let cfg = match AppConfig::load_or_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(event = "config_invalid", path = %configs::config_path(), error = %e, "failed to load configuration");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let run_id = Uuid::new_v4();
    let threads = worker_threads(&cfg);
    let rt = match build_runtime(threads) {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        event = "start",
        %run_id,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        threads,
        "key check server starting"
    );

    match rt.block_on(server::run(cfg)) {
        Ok(()) => {
            info!(event = "stop", %run_id, "key check server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(event = "run_failed", %run_id, error = %e, "key check server failed");
            ExitCode::FAILURE
        }
    }
}

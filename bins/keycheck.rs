use std::process::ExitCode;

use checker::{BatchChecker, GeminiValidator};
use clap::Parser;
use configs::AppConfig;
use dotenvy::dotenv;
use gemini_key_checker::cli::{execute, Cli, EXIT_INPUT};
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    common::utils::logging::init_logging_cli(cli.verbose);

    let mut stderr = std::io::stderr();
    let cfg = match cli.resolve_config(AppConfig::load_or_default(), &mut stderr) {
        Ok(cfg) => cfg,
        Err(code) => return ExitCode::from(code),
    };

    let raw = match cli.raw_input(std::io::stdin().lock()) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::from(EXIT_INPUT);
        }
    };

    let validator = match GeminiValidator::from_config(&cfg.checker) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_INPUT);
        }
    };
    debug!(endpoint = %validator.endpoint(), auth = %validator.auth(), "checker configured");

    let checker = BatchChecker::new(validator);
    let code = execute(&checker, &raw, cli.json, &mut std::io::stdout(), &mut stderr).await;
    ExitCode::from(code)
}

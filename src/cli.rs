//! `keycheck` command line: argument model, input gathering and report output.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use checker::report::{self, Tally};
use checker::{BatchChecker, CheckError, KeyCheck};
use clap::Parser;
use configs::{AppConfig, AuthScheme};
use tracing::error;

/// Exit status for missing keys and configuration errors.
pub const EXIT_INPUT: u8 = 2;
/// Exit status when the report could not be written.
pub const EXIT_OUTPUT: u8 = 4;

#[derive(Parser, Debug)]
#[command(name = "keycheck", version, about = "Check whether Gemini API keys are usable")]
pub struct Cli {
    /// Keys to check; commas split further. `-` reads keys from stdin.
    pub keys: Vec<String>,
    /// Read newline or comma separated keys from a file
    #[arg(long, short)]
    pub file: Option<PathBuf>,
    /// Fallback key when no other input is given
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Credential placement: bearer, query or header
    #[arg(long)]
    pub auth: Option<AuthScheme>,
    /// Model-listing endpoint to query
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    #[arg(long, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(long, short, help = "Log request details to stderr")]
    pub verbose: bool,
}

impl Cli {
    fn reads_stdin(&self) -> bool {
        self.keys.iter().any(|k| k == "-")
    }

    /// Gather raw key text: arguments, then `--file`, then stdin when `-` was
    /// given. `--api-key`/`GEMINI_API_KEY` is used only if all of that is blank.
    pub fn raw_input(&self, mut stdin: impl Read) -> anyhow::Result<String> {
        let mut pieces: Vec<String> = self.keys.iter().filter(|k| *k != "-").cloned().collect();
        if let Some(path) = &self.file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading keys from {}", path.display()))?;
            pieces.push(content);
        }
        if self.reads_stdin() {
            let mut buf = String::new();
            stdin.read_to_string(&mut buf).context("reading keys from stdin")?;
            pieces.push(buf);
        }

        let raw = pieces.join("\n");
        match &self.api_key {
            Some(key) if raw.trim().is_empty() => Ok(key.clone()),
            _ => Ok(raw),
        }
    }

    /// Apply command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, mut cfg: AppConfig) -> anyhow::Result<AppConfig> {
        if let Some(auth) = self.auth {
            cfg.checker.auth = auth;
        }
        if let Some(endpoint) = &self.endpoint {
            cfg.checker.endpoint = endpoint.clone();
        }
        if let Some(secs) = self.timeout {
            cfg.checker.request_timeout_secs = secs;
        }
        cfg.checker.normalize()?;
        Ok(cfg)
    }

    /// Resolve the effective configuration, reporting failures on `err`.
    pub fn resolve_config(
        &self,
        loaded: anyhow::Result<AppConfig>,
        err: &mut impl Write,
    ) -> Result<AppConfig, u8> {
        match loaded.and_then(|cfg| self.apply_overrides(cfg)) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                error!(event = "config_invalid", error = %e, "invalid configuration");
                let _ = writeln!(err, "configuration error: {e:#}");
                Err(EXIT_INPUT)
            }
        }
    }
}

/// Check every key in `raw`, write the report to `out` and return the exit status.
pub async fn execute<V: KeyCheck + 'static>(
    batch: &BatchChecker<V>,
    raw: &str,
    json: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> u8 {
    let keys = checker::parse_keys(raw);
    if !json && !keys.is_empty() {
        let _ = writeln!(err, "{}", report::checking_banner(keys.len()));
    }

    let reports = match batch.check_keys(keys).await {
        Ok(reports) => reports,
        Err(CheckError::EmptyInput) | Err(CheckError::EmptyKey) => {
            let _ = writeln!(
                err,
                "Please enter at least one API key (arguments, --file, stdin or GEMINI_API_KEY)."
            );
            return EXIT_INPUT;
        }
        Err(e) => {
            let _ = writeln!(err, "{e}");
            return EXIT_INPUT;
        }
    };
    let tally = Tally::from_reports(&reports);

    let written = if json {
        let doc = serde_json::json!({ "results": reports, "tally": tally });
        serde_json::to_string_pretty(&doc)
            .map_err(anyhow::Error::from)
            .and_then(|text| writeln!(out, "{text}").map_err(anyhow::Error::from))
    } else if let [single] = reports.as_slice() {
        writeln!(out, "{} → {}", single.label, single.outcome).map_err(anyhow::Error::from)
    } else {
        writeln!(out, "{}", report::render_batch(&reports))
            .and_then(|_| writeln!(err, "{}", tally.summary_line()))
            .map_err(anyhow::Error::from)
    };
    if let Err(e) = written {
        error!(event = "report_write_failed", error = %e, "could not write report");
        return EXIT_OUTPUT;
    }

    tally.exit_code()
}

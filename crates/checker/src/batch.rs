use std::sync::Arc;

use tracing::{error, info};

use crate::keys::{mask_key, parse_keys, sanitize_key};
use crate::outcome::Outcome;
use crate::report::KeyReport;
use crate::validator::KeyCheck;
use crate::CheckError;

/// Runs a [`KeyCheck`] over one key or a free-form list of keys.
pub struct BatchChecker<V> {
    validator: Arc<V>,
}

impl<V> Clone for BatchChecker<V> {
    fn clone(&self) -> Self {
        Self { validator: Arc::clone(&self.validator) }
    }
}

impl<V: KeyCheck + 'static> BatchChecker<V> {
    pub fn new(validator: V) -> Self {
        Self { validator: Arc::new(validator) }
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Check a single key typed by the user.
    pub async fn check_one(&self, raw: &str) -> Result<Outcome, CheckError> {
        let key = sanitize_key(raw).ok_or(CheckError::EmptyKey)?;
        Ok(self.validator.check(&key).await)
    }

    /// Parse newline/comma separated keys and check them all.
    pub async fn check_all(&self, raw: &str) -> Result<Vec<KeyReport>, CheckError> {
        self.check_keys(parse_keys(raw)).await
    }

    /// Check already parsed keys concurrently.
    ///
    /// Every key gets its own task and every task is awaited, so one failing
    /// or panicking check never affects its siblings. Reports come back in
    /// input order.
    pub async fn check_keys(&self, keys: Vec<String>) -> Result<Vec<KeyReport>, CheckError> {
        if keys.is_empty() {
            return Err(CheckError::EmptyInput);
        }
        info!(event = "batch_start", keys = keys.len(), "checking keys");

        let handles: Vec<_> = keys
            .iter()
            .map(|key| {
                let validator = Arc::clone(&self.validator);
                let key = key.clone();
                tokio::spawn(async move { validator.check(&key).await })
            })
            .collect();

        let mut reports = Vec::with_capacity(keys.len());
        for (key, handle) in keys.iter().zip(handles) {
            let label = mask_key(key);
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let reason = if e.is_panic() { "check task panicked" } else { "check task cancelled" };
                    error!(key = %label, error = %e, "key check task failed");
                    Outcome::TransportError(reason.to_string())
                }
            };
            reports.push(KeyReport::new(label, outcome));
        }

        info!(event = "batch_done", keys = reports.len(), "all key checks settled");
        Ok(reports)
    }
}

use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder};

use crate::outcome::Outcome;

// Prometheus metrics (default registry)
pub static KEY_CHECKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "key_checks_total",
        "Total key checks by outcome",
        &["outcome"]
    )
    .expect("register key_checks_total")
});

pub static CHECK_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "key_check_duration_seconds",
        "Key check duration in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register key_check_duration")
});

pub fn record(outcome: &Outcome, elapsed_secs: f64) {
    KEY_CHECKS_TOTAL.with_label_values(&[outcome.kind()]).inc();
    CHECK_DURATION.observe(elapsed_secs);
}

/// Text exposition of the default registry.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

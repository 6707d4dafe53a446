use serde::Serialize;

use crate::outcome::Outcome;

/// One rendered entry of a batch: masked label plus outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyReport {
    pub label: String,
    pub outcome: Outcome,
}

impl KeyReport {
    pub fn new(label: String, outcome: Outcome) -> Self {
        Self { label, outcome }
    }

    /// `• <label> → <summary>`
    pub fn line(&self) -> String {
        format!("• {} → {}", self.label, self.outcome.summary())
    }
}

pub fn render_batch(reports: &[KeyReport]) -> String {
    reports.iter().map(KeyReport::line).collect::<Vec<_>>().join("\n")
}

pub fn checking_banner(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Checking {count} key{plural}…")
}

/// Per-variant counts of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub valid: usize,
    pub invalid: usize,
    pub ambiguous: usize,
    pub transport_error: usize,
}

impl Tally {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        let mut tally = Tally::default();
        for outcome in outcomes {
            tally.add(outcome);
        }
        tally
    }

    pub fn from_reports(reports: &[KeyReport]) -> Self {
        Self::from_outcomes(reports.iter().map(|r| &r.outcome))
    }

    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Valid => self.valid += 1,
            Outcome::Invalid => self.invalid += 1,
            Outcome::Ambiguous(_) => self.ambiguous += 1,
            Outcome::TransportError(_) => self.transport_error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.valid + self.invalid + self.ambiguous + self.transport_error
    }

    /// Process exit status: 1 if any key was rejected, else 3 if any check
    /// failed to complete, else 0.
    pub fn exit_code(&self) -> u8 {
        if self.invalid > 0 {
            1
        } else if self.transport_error > 0 {
            3
        } else {
            0
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} checked: {} valid, {} invalid, {} restricted, {} errors",
            self.total(),
            self.valid,
            self.invalid,
            self.ambiguous,
            self.transport_error
        )
    }
}

//! Gemini API key checking.
//!
//! A [`KeyCheck`] classifies one candidate key into an [`Outcome`];
//! [`BatchChecker`] fans a free-form list of keys out over it and reports
//! every result in input order with the key masked.

use thiserror::Error;

pub mod batch;
pub mod keys;
pub mod observability;
pub mod outcome;
pub mod report;
pub mod validator;

pub use batch::BatchChecker;
pub use keys::{mask_key, parse_keys, sanitize_key};
pub use outcome::Outcome;
pub use report::{KeyReport, Tally};
pub use validator::{GeminiValidator, KeyCheck};

#[derive(Debug, Error)]
pub enum CheckError {
    /// The single-key field was blank after trimming.
    #[error("please paste an API key first")]
    EmptyKey,
    /// No keys were left after parsing the free-form list.
    #[error("please enter at least one API key")]
    EmptyInput,
    #[error("http client error: {0}")]
    Client(String),
}

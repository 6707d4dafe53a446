use std::fmt;

use serde::Serialize;

/// Classification of a single key check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The provider answered 200.
    Valid,
    /// The provider answered 401.
    Invalid,
    /// Any other status; the key may work but be restricted.
    Ambiguous(u16),
    /// No response was received.
    TransportError(String),
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Outcome::Valid,
            401 => Outcome::Invalid,
            other => Outcome::Ambiguous(other),
        }
    }

    /// Stable lowercase tag, used for JSON and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Valid => "valid",
            Outcome::Invalid => "invalid",
            Outcome::Ambiguous(_) => "ambiguous",
            Outcome::TransportError(_) => "transport_error",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Valid => Some(200),
            Outcome::Invalid => Some(401),
            Outcome::Ambiguous(code) => Some(*code),
            Outcome::TransportError(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid)
    }

    /// Short form used on batch report lines.
    pub fn summary(&self) -> String {
        match self {
            Outcome::Valid => "✅ Valid (200)".to_string(),
            Outcome::Invalid => "❌ Invalid (401)".to_string(),
            Outcome::Ambiguous(code) => format!("⚠️ Maybe restricted ({code})"),
            Outcome::TransportError(msg) => format!("⚠️ Network/CORS error ({msg})"),
        }
    }

    pub fn view(&self) -> OutcomeView<'_> {
        OutcomeView {
            kind: self.kind(),
            status: self.status(),
            message: match self {
                Outcome::TransportError(msg) => Some(msg.as_str()),
                _ => None,
            },
            summary: self.summary(),
        }
    }
}

/// Long form used for a single-key check.
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Valid => f.write_str("✅ Valid & working API key"),
            Outcome::Invalid => f.write_str("❌ Invalid API key"),
            Outcome::Ambiguous(code) => {
                write!(f, "⚠️ Key might be valid but restricted (status: {code})")
            }
            Outcome::TransportError(msg) => {
                write!(f, "⚠️ Network or CORS error. Details: {msg}")
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutcomeView<'a> {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    pub summary: String,
}

impl Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

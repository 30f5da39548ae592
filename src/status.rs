//! Interpretation of workflow status payloads.
//!
//! The orchestrator answers status requests with
//! `{"data": {"status": "...", "output": ...}}`, but the shape is not
//! guaranteed across service versions. [`interpret`] therefore never fails:
//! anything it cannot read becomes [`StatusKind::Unknown`] with no output and
//! the poll loop decides what to do next.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    Pending,
    Running,
    Success,
    Failed,
    Timeout,
    /// Status missing or not recognized. Treated as non-terminal.
    #[serde(other)]
    Unknown,
}

impl StatusKind {
    /// Parses a status label, falling back to [`StatusKind::Unknown`].
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "PENDING" => StatusKind::Pending,
            "RUNNING" => StatusKind::Running,
            "SUCCESS" => StatusKind::Success,
            "FAILED" => StatusKind::Failed,
            "TIMEOUT" => StatusKind::Timeout,
            _ => StatusKind::Unknown,
        }
    }

    /// Whether polling stops at this status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StatusKind::Success | StatusKind::Failed | StatusKind::Timeout
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Pending => "PENDING",
            StatusKind::Running => "RUNNING",
            StatusKind::Success => "SUCCESS",
            StatusKind::Failed => "FAILED",
            StatusKind::Timeout => "TIMEOUT",
            StatusKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single status fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub status: StatusKind,
    pub output: Option<String>,
    /// The payload as received. Non-JSON bodies are kept as a JSON string.
    pub raw: Value,
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Wire schema for status responses. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    data: Option<StatusData>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusData {
    /// Defaults to `UNKNOWN` when absent.
    #[serde(default)]
    status: Option<String>,
    /// Defaults to no output when absent or `null`.
    #[serde(default)]
    output: Option<Value>,
}

/// Interprets a raw response body.
pub fn interpret(raw: &[u8]) -> PollOutcome {
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) => interpret_value(value),
        Err(_) => PollOutcome {
            status: StatusKind::Unknown,
            output: None,
            raw: Value::String(String::from_utf8_lossy(raw).into_owned()),
        },
    }
}

/// Interprets an already-parsed payload.
pub fn interpret_value(raw: Value) -> PollOutcome {
    let data = StatusPayload::deserialize(&raw)
        .ok()
        .and_then(|payload| payload.data)
        .unwrap_or_default();

    PollOutcome {
        status: data
            .status
            .as_deref()
            .map(StatusKind::parse)
            .unwrap_or(StatusKind::Unknown),
        output: data.output.and_then(output_text),
        raw,
    }
}

/// Flattens the free-form `output` field into text.
///
/// Web-automation workflows report `{"result": "..."}`; other services send a
/// bare string. Anything else is passed through as compact JSON.
fn output_text(output: Value) -> Option<String> {
    match output {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("result") {
                return Some(text.clone());
            }
            Some(Value::Object(map).to_string())
        }
        other => Some(other.to_string()),
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::WorkflowId;

/// Broad failure classes carried by an [`ErrorEnvelope`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request never produced a response (DNS, connect, timeout, body read).
    Transport,
    /// The service answered with a non-2xx status.
    Status,
    /// The service answered 2xx but the body did not have the expected shape.
    Malformed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Transport => "transport",
            FailureKind::Status => "status",
            FailureKind::Malformed => "malformed",
        };
        write!(f, "{label}")
    }
}

/// Diagnostic context for a failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Raw response body for debugging (when available).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ErrorEnvelope {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
            http_status: None,
            body: None,
        }
    }

    pub fn status(http_status: u16, message: impl Into<String>, body: Option<String>) -> Self {
        Self {
            kind: FailureKind::Status,
            message: message.into(),
            http_status: Some(http_status),
            body: body.filter(|b| !b.is_empty()),
        }
    }

    pub fn malformed(message: impl Into<String>, body: Option<String>) -> Self {
        Self {
            kind: FailureKind::Malformed,
            message: message.into(),
            http_status: None,
            body: body.filter(|b| !b.is_empty()),
        }
    }

    pub fn with_http_status(mut self, http_status: u16) -> Self {
        self.http_status = Some(http_status);
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.http_status) {
            (FailureKind::Status, Some(status)) => write!(f, "{}: {}", status, self.message),
            (kind, _) => write!(f, "{}: {}", kind, self.message),
        }
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<reqwest::Error> for ErrorEnvelope {
    fn from(err: reqwest::Error) -> Self {
        let label = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connection failed"
        } else if err.is_body() || err.is_decode() {
            "failed to read response body"
        } else {
            "request failed"
        };
        let mut envelope = ErrorEnvelope::transport(format!("{label}: {err}"));
        envelope.http_status = err.status().map(|s| s.as_u16());
        envelope
    }
}

/// Convenience alias for fallible client results.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type surfaced by the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credential or unusable configuration. Raised before any request.
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Submission(ErrorEnvelope),

    #[error("{envelope}")]
    Poll {
        workflow_id: WorkflowId,
        envelope: ErrorEnvelope,
    },

    #[error("polling of workflow {workflow_id} was cancelled")]
    Cancelled { workflow_id: WorkflowId },
}

impl Error {
    /// The envelope behind a submission or poll failure, if any.
    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            Error::Submission(envelope) | Error::Poll { envelope, .. } => Some(envelope),
            Error::Config(_) | Error::Cancelled { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_envelope_formats_with_code() {
        let err = ErrorEnvelope::status(503, "Service Unavailable", Some("down".into()));
        assert_eq!(err.to_string(), "503: Service Unavailable");
        assert_eq!(err.body.as_deref(), Some("down"));
    }

    #[test]
    fn empty_body_is_dropped() {
        let err = ErrorEnvelope::malformed("missing workflowId", Some(String::new()));
        assert!(err.body.is_none());
        assert_eq!(err.to_string(), "malformed: missing workflowId");
    }

    #[test]
    fn envelope_accessor_covers_request_failures() {
        let poll = Error::Poll {
            workflow_id: WorkflowId::new("wf_1"),
            envelope: ErrorEnvelope::transport("connection failed"),
        };
        assert_eq!(poll.envelope().map(|e| e.kind), Some(FailureKind::Transport));
        assert!(Error::Config("missing".into()).envelope().is_none());
    }
}

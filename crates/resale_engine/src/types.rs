use std::fmt;

use resale_core::{LensCandidate, RequestId, RunId, StreamFrame};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// One decoded frame of a running comparison.
    Frame { run_id: RunId, frame: StreamFrame },
    /// Sent exactly once per started run, whatever the outcome.
    RunFinished {
        run_id: RunId,
        result: Result<StreamSummary, FetchError>,
    },
    CandidatesFetched {
        request_id: RequestId,
        result: Result<LensResponse, FetchError>,
    },
}

/// Bookkeeping for a stream that closed without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    pub bytes: u64,
    pub frames: usize,
    pub saw_result: bool,
}

/// Body of the candidate lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LensResponse {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub candidates: Vec<LensCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "Cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match &self.kind {
            FailureKind::HttpStatus(status) if self.message.is_empty() => format!("HTTP {status}"),
            FailureKind::HttpStatus(status) => format!("HTTP {status}: {}", self.message),
            FailureKind::Cancelled => "Cancelled".to_string(),
            _ if self.message.is_empty() => self.kind.to_string(),
            _ => self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    Io,
    HttpStatus(u16),
    Network,
    Decode,
    /// The service sent an `error` frame.
    Protocol,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidInput => write!(f, "invalid input"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Protocol => write!(f, "service error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

//! Per-adapter failure types.
//!
//! These never cross the registry boundary as errors: the registry converts
//! each one into an [`AdapterFailure`] reported next to the merged result.

use serde::{Serialize, Serializer};
use std::time::Duration;

/// Result type for a single adapter call
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Why one upstream call did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Could not decode upstream payload: {0}")]
    Decode(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled by caller")]
    Cancelled,

    #[error("Adapter unavailable: {0}")]
    Unavailable(String),
}

impl AdapterError {
    /// Transport failures, timeouts, HTTP 429 and HTTP 5xx are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::Cancelled | Self::Unavailable(_) => false,
        }
    }
}

fn display<S: Serializer>(error: &AdapterError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// A failed adapter call, as reported to callers of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterFailure {
    pub adapter: String,
    #[serde(serialize_with = "display")]
    pub error: AdapterError,
}

impl AdapterFailure {
    pub fn new(adapter: impl Into<String>, error: AdapterError) -> Self {
        Self {
            adapter: adapter.into(),
            error,
        }
    }
}

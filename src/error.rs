use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Per-item failure taxonomy. `Cancelled` is never retried and propagates
/// immediately; every other variant counts against the retry budget.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error {status}: {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("request failed for {url}: {source}")]
    Transfer {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The downloaded (or pre-existing) content does not match the expected
    /// hash. Treated as transient, not malicious: the temp file is discarded
    /// and the attempt is retried.
    #[error("SHA-1 mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("download cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// One work item that exhausted its retry budget.
#[derive(Debug)]
pub struct ItemFailure {
    pub name: String,
    pub url: String,
    pub error: FetchError,
}

/// Run-level error under the collect-all policy: every failed item is listed
/// so a caller can see exactly what is missing after the run.
#[derive(Debug)]
pub struct AggregateFailure {
    pub failures: Vec<ItemFailure>,
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file(s) failed to download", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.name, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

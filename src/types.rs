use crate::error::FetchError;
use crate::progress::Phase;
use std::path::PathBuf;

/// One file to be fetched, verified and stored.
///
/// Work items are planned fresh per orchestration run; the destination is a
/// pure function of the manifest entry, so two resolutions of the same
/// manifest always produce the same work list.
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Human-readable name surfaced through progress callbacks and errors.
    pub name: String,

    pub source_url: String,

    /// Absolute path inside the versioned install layout.
    pub destination: PathBuf,

    /// Hex SHA-1; absent for legacy direct-URL libraries.
    pub expected_sha1: Option<String>,

    pub phase: Phase,

    /// Size from the manifest, for planning only. Not authoritative for
    /// verification.
    pub size: Option<u64>,
}

/// Terminal result for one work item.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Bytes were transferred, verified and moved into place.
    Downloaded,

    /// The existing file already matched the expected hash; no network call
    /// was made.
    AlreadyPresent,

    /// The retry budget was exhausted, or the run was cancelled.
    Failed(FetchError),
}

//! Asset acquisition and verification engine for Minecraft-style game
//! installs.
//!
//! Given an already-parsed version manifest, [`DownloadOrchestrator`] expands
//! it into two work lists (core files and content-addressed asset objects),
//! downloads them under a bounded concurrency gate, verifies every file
//! against its SHA-1, and writes it atomically into a versioned on-disk
//! layout. Re-running against a populated root performs no transfers: every
//! file resolves through the existing-file hash-match fast path.

pub mod batch;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod hash;
pub mod layout;
pub mod manifest;
pub mod orchestrator;
pub mod platform;
pub mod progress;
pub mod resolver;
pub mod types;

pub use config::InstallConfig;
pub use error::{AggregateFailure, FetchError, ItemFailure};
pub use layout::InstallLayout;
pub use manifest::{AssetIndexFile, VersionManifest};
pub use orchestrator::DownloadOrchestrator;
pub use progress::{Phase, ProgressReporter, SilentProgressReporter};
pub use types::{DownloadOutcome, WorkItem};

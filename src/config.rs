//! Run-level settings for the download engine.
//! The orchestrator takes an explicit [`InstallConfig`] value instead of
//! reading ambient global state, so the core stays testable in isolation.

use std::time::Duration;

// URL Constants
pub const RESOURCES_BASE_URL: &str = "https://resources.download.minecraft.net";

pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const RETRY_COUNT: u32 = 3;
pub const RETRY_DELAY_SECS: u64 = 2;

/// Bounds for the number of simultaneous in-flight transfers.
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const MAX_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Number of concurrent downloads, shared across both phases.
    pub concurrency: usize,

    /// Attempts per file before the item is surfaced as failed.
    pub retry_count: u32,

    /// Delay between attempts.
    pub retry_delay: Duration,

    /// Timeout for any single network call. Distinct from the retry budget.
    pub request_timeout: Duration,

    /// Base URL of the content-addressed asset CDN.
    pub resources_base_url: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry_count: RETRY_COUNT,
            retry_delay: Duration::from_secs(RETRY_DELAY_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            resources_base_url: RESOURCES_BASE_URL.to_string(),
        }
    }
}

impl InstallConfig {
    /// User settings allow 1..=10; anything outside is clamped.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}

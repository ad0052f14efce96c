//! Fans a phase's work list out across the shared concurrency gate and
//! collects per-item outcomes.
//!
//! Policy: collect-all. A failed item does not abort its siblings; every
//! failure is recorded and reported together at the end of the run, so a user
//! keeps the transfers that did succeed and sees everything that is missing.

use crate::error::{FetchError, ItemFailure};
use crate::fetch::Fetcher;
use crate::gate::ConcurrencyGate;
use crate::progress::{Phase, ProgressAggregator};
use crate::types::{DownloadOutcome, WorkItem};
use futures::stream::{self, StreamExt};

/// Run every item of one phase to a terminal outcome. Exactly one progress
/// record is made per item, failures included, so `completed` reaches `total`
/// even on a partially failed run.
pub async fn run_items(
    fetcher: &Fetcher,
    gate: &ConcurrencyGate,
    progress: &ProgressAggregator,
    phase: Phase,
    items: Vec<WorkItem>,
) -> Vec<ItemFailure> {
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    log::info!("Starting {} phase: {} file(s)", phase.as_str(), total);

    let failures: Vec<ItemFailure> = stream::iter(items)
        .map(|item| async move {
            let _permit = gate.acquire().await;

            // A cancellation seen before the item starts short-circuits the
            // attempt entirely; the item still gets its terminal record.
            let outcome = if progress.is_cancelled() {
                DownloadOutcome::Failed(FetchError::Cancelled)
            } else {
                fetcher.fetch_and_store(&item, progress.reporter()).await
            };

            progress.record(phase, &item.name);

            match outcome {
                DownloadOutcome::Downloaded => {
                    log::debug!("Downloaded: {}", item.name);
                    None
                }
                DownloadOutcome::AlreadyPresent => {
                    log::debug!("Already present: {}", item.name);
                    None
                }
                DownloadOutcome::Failed(error) => Some(ItemFailure {
                    name: item.name,
                    url: item.source_url,
                    error,
                }),
            }
        })
        .buffer_unordered(gate.capacity())
        .filter_map(|failure| async move { failure })
        .collect()
        .await;

    log::info!(
        "Finished {} phase: {}/{} succeeded",
        phase.as_str(),
        total - failures.len(),
        total
    );
    failures
}

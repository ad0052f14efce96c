//! Fetch-verify-store for a single work item: download to a temporary file
//! beside the destination, verify the SHA-1, then move into place atomically.
//! Retries transient failures up to a fixed budget with a fixed delay.

use crate::config::InstallConfig;
use crate::error::FetchError;
use crate::hash;
use crate::progress::ProgressReporter;
use crate::types::{DownloadOutcome, WorkItem};
use futures::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

pub struct Fetcher {
    client: Client,
    retry_count: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(client: Client, config: &InstallConfig) -> Self {
        Self {
            client,
            retry_count: config.retry_count.max(1),
            retry_delay: config.retry_delay,
        }
    }

    /// Fetch, verify and store one work item. Exactly one terminal outcome
    /// per call; errors are folded into [`DownloadOutcome::Failed`].
    pub async fn fetch_and_store(
        &self,
        item: &WorkItem,
        reporter: &dyn ProgressReporter,
    ) -> DownloadOutcome {
        match self.try_fetch(item, reporter).await {
            Ok(outcome) => outcome,
            Err(error) => {
                if !error.is_cancelled() {
                    log::error!("Giving up on {}: {}", item.name, error);
                }
                DownloadOutcome::Failed(error)
            }
        }
    }

    async fn try_fetch(
        &self,
        item: &WorkItem,
        reporter: &dyn ProgressReporter,
    ) -> Result<DownloadOutcome, FetchError> {
        // Existing-file fast path: a matching hash means no network call at
        // all, which is what makes whole-run re-execution cheap.
        if let Some(expected) = &item.expected_sha1 {
            match hash::verify_file(&item.destination, expected).await {
                Ok(true) => {
                    log::debug!("File exists and hash matches, skipping: {:?}", item.destination);
                    return Ok(DownloadOutcome::AlreadyPresent);
                }
                Ok(false) => {
                    if item.destination.exists() {
                        log::info!(
                            "File exists but hash mismatches, re-downloading: {:?}",
                            item.destination
                        );
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Failed to verify existing file {}: {}",
                        item.destination.display(),
                        e
                    );
                }
            }
        } else if item.destination.exists() {
            // Legacy entries carry no hash; an existing file is trusted.
            log::debug!(
                "File exists and no hash provided, assuming valid: {:?}",
                item.destination
            );
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        if let Some(parent) = item.destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut attempt = 0u32;
        loop {
            if reporter.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            attempt += 1;
            match self.transfer_once(item, reporter).await {
                Ok(()) => {
                    log::debug!("Download complete: {:?}", item.destination);
                    return Ok(DownloadOutcome::Downloaded);
                }
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => {
                    if attempt >= self.retry_count {
                        return Err(error);
                    }
                    log::warn!(
                        "Download failed (attempt {}/{}): {}. Retrying...",
                        attempt,
                        self.retry_count,
                        error
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// One transfer attempt: stream to `<name>.part` next to the destination
    /// (same volume, so the final rename is atomic), hashing incrementally.
    /// The temp file never survives this function on a failure path.
    async fn transfer_once(
        &self,
        item: &WorkItem,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FetchError> {
        let url = &item.source_url;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transfer {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.clone(),
            });
        }

        let tmp_path = temp_path_for(&item.destination);
        let result = self
            .stream_to_file(response, &tmp_path, item, reporter)
            .await;

        match result {
            Ok(()) => match tokio::fs::rename(&tmp_path, &item.destination).await {
                Ok(()) => Ok(()),
                Err(source) => {
                    let _ = tokio::fs::remove_file(&tmp_path).await;
                    Err(FetchError::Io {
                        path: item.destination.clone(),
                        source,
                    })
                }
            },
            Err(error) => {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                Err(error)
            }
        }
    }

    async fn stream_to_file(
        &self,
        response: reqwest::Response,
        tmp_path: &Path,
        item: &WorkItem,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FetchError> {
        let io_err = |source: std::io::Error| FetchError::Io {
            path: tmp_path.to_path_buf(),
            source,
        };

        let mut file = File::create(tmp_path).await.map_err(io_err)?;
        let mut hasher = Sha1::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            if reporter.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let chunk = chunk_result.map_err(|source| FetchError::Transfer {
                url: item.source_url.clone(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(io_err)?;
            hasher.update(&chunk);
        }

        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);

        if let Some(expected) = &item.expected_sha1 {
            let computed = format!("{:x}", hasher.finalize());
            if !computed.eq_ignore_ascii_case(expected) {
                return Err(FetchError::HashMismatch {
                    url: item.source_url.clone(),
                    expected: expected.clone(),
                    actual: computed,
                });
            }
            log::debug!("SHA-1 validated: {}", computed);
        }

        Ok(())
    }

    /// Fetch and deserialize a JSON document. Resolution-phase helper; a
    /// failure here is fatal to the run, so there is no retry loop.
    pub async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, FetchError> {
        log::debug!("Downloading JSON: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transfer {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        response.json().await.map_err(|source| FetchError::Transfer {
            url: url.to_string(),
            source,
        })
    }
}

fn temp_path_for(destination: &Path) -> PathBuf {
    let tmp_name = format!(
        "{}.part",
        destination
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("download")
    );
    destination.with_file_name(tmp_name)
}

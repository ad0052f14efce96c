//! Top-level coordinator for one version install: plans both work lists,
//! then drives the core and resource phases concurrently under one shared
//! concurrency gate.

use crate::batch;
use crate::config::InstallConfig;
use crate::error::{AggregateFailure, FetchError};
use crate::fetch::Fetcher;
use crate::gate::ConcurrencyGate;
use crate::layout::InstallLayout;
use crate::manifest::VersionManifest;
use crate::platform::{Arch, OsType};
use crate::progress::{Phase, ProgressAggregator, ProgressReporter};
use crate::resolver;
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct DownloadOrchestrator {
    config: InstallConfig,
    layout: InstallLayout,
    client: Client,
}

impl DownloadOrchestrator {
    pub fn new(root: impl Into<PathBuf>, config: InstallConfig) -> Result<Self> {
        // One shared HTTP client for the whole run.
        let client = Client::builder()
            .pool_max_idle_per_host(config.effective_concurrency())
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .timeout(config.request_timeout)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            config,
            layout: InstallLayout::new(root),
            client,
        })
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Download, verify and store every file the manifest describes.
    ///
    /// The core phase (main archive, libraries, natives, logging config) and
    /// the resource phase (asset objects) run concurrently; their interleaving
    /// is unspecified beyond what the shared gate admits. The run is complete
    /// only when both phases finish. A resolver failure is fatal before any
    /// transfer starts; per-item failures are collected and surfaced together
    /// as an [`AggregateFailure`].
    pub async fn download_all(
        &self,
        manifest: &VersionManifest,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<()> {
        log::info!("Starting download of version files for {}", manifest.id);

        // Planning: directories plus both work lists. Nothing is transferred
        // yet except the asset index itself.
        self.layout
            .ensure_skeleton(&manifest.id)
            .context("creating install directories")?;

        let fetcher = Fetcher::new(self.client.clone(), &self.config);
        let os = OsType::current();
        let arch = Arch::current();

        let core_items = resolver::core_work_items(manifest, &self.layout, os, arch);
        resolver::assert_unique_destinations(&core_items)?;

        let index =
            resolver::resolve_asset_index(&fetcher, manifest, &self.layout, reporter.as_ref())
                .await?;
        let resource_items =
            resolver::resource_work_items(&index, &self.layout, &self.config.resources_base_url);

        let progress = ProgressAggregator::new(reporter.clone());
        progress.set_total(Phase::Core, core_items.len());
        progress.set_total(Phase::Resource, resource_items.len());

        log::info!(
            "Planned {} core file(s) and {} resource file(s)",
            core_items.len(),
            resource_items.len()
        );

        let gate = ConcurrencyGate::new(self.config.effective_concurrency());

        let (core_failures, resource_failures) = tokio::join!(
            batch::run_items(&fetcher, &gate, &progress, Phase::Core, core_items),
            batch::run_items(&fetcher, &gate, &progress, Phase::Resource, resource_items),
        );

        let mut failures = core_failures;
        failures.extend(resource_failures);

        if reporter.is_cancelled() {
            log::warn!("Download run cancelled for {}", manifest.id);
            return Err(FetchError::Cancelled.into());
        }

        if !failures.is_empty() {
            return Err(AggregateFailure { failures }.into());
        }

        log::info!("Finished download of version files for {}", manifest.id);
        Ok(())
    }
}

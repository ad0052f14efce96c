//! Expands a version manifest into the flat work lists for both phases.
//! Planning is pure given the manifest and platform; the only network touch
//! is the asset index, which goes through a read-through disk cache.

use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::hash;
use crate::layout::{maven_to_relative_path, InstallLayout};
use crate::manifest::{AssetIndexFile, VersionManifest};
use crate::platform::{resolve_native_classifier, rules_allow, Arch, OsType};
use crate::progress::{Phase, ProgressReporter};
use crate::types::{DownloadOutcome, WorkItem};
use anyhow::{bail, Context, Result};
use std::collections::HashSet;

/// Fetch and parse the asset index, reusing the on-disk copy at
/// `assets/indexes/<id>.json` when its hash still matches the manifest.
/// A stale or corrupt cached copy is re-fetched rather than trusted.
pub async fn resolve_asset_index(
    fetcher: &Fetcher,
    manifest: &VersionManifest,
    layout: &InstallLayout,
    reporter: &dyn ProgressReporter,
) -> Result<AssetIndexFile> {
    let index_ref = &manifest.asset_index;
    let index_path = layout.asset_index_path(&index_ref.id);

    let mut needs_fetch = true;
    if index_path.exists() {
        match hash::verify_file(&index_path, &index_ref.sha1).await {
            Ok(true) => needs_fetch = false,
            Ok(false) => {
                log::info!(
                    "Cached asset index {} does not match manifest hash, re-fetching",
                    index_ref.id
                );
            }
            Err(e) => {
                log::warn!("Failed to verify cached asset index: {}", e);
            }
        }
    }

    if needs_fetch {
        log::info!(
            "Downloading asset index {} -> {:?}",
            index_ref.url,
            index_path
        );
        let item = WorkItem {
            name: format!("{}.json", index_ref.id),
            source_url: index_ref.url.clone(),
            destination: index_path.clone(),
            expected_sha1: Some(index_ref.sha1.clone()),
            phase: Phase::Resource,
            size: Some(index_ref.size),
        };
        match fetcher.fetch_and_store(&item, reporter).await {
            DownloadOutcome::Downloaded | DownloadOutcome::AlreadyPresent => {}
            DownloadOutcome::Failed(error) => {
                return Err(error).context("fetching asset index");
            }
        }
    }

    let bytes = tokio::fs::read(&index_path)
        .await
        .context("reading asset index")?;
    serde_json::from_slice(&bytes).context("parsing asset index")
}

/// Work items for the core phase: main archive, logging config, and every
/// rule-applicable library (plus its native classifier artifact, when one
/// exists for the current platform).
pub fn core_work_items(
    manifest: &VersionManifest,
    layout: &InstallLayout,
    os: OsType,
    arch: Arch,
) -> Vec<WorkItem> {
    let mut items = Vec::new();

    let client = &manifest.downloads.client;
    items.push(WorkItem {
        name: format!("{}.jar", manifest.id),
        source_url: client.url.clone(),
        destination: layout.client_jar_path(&manifest.id),
        expected_sha1: Some(client.sha1.clone()),
        phase: Phase::Core,
        size: Some(client.size),
    });

    if let Some(logging) = &manifest.logging {
        let file = &logging.client.file;
        items.push(WorkItem {
            name: file.id.clone(),
            source_url: file.url.clone(),
            destination: layout.logging_config_path(&manifest.id, &file.id),
            expected_sha1: Some(file.sha1.clone()),
            phase: Phase::Core,
            size: Some(file.size),
        });
    }

    for library in &manifest.libraries {
        if !rules_allow(library.rules.as_deref(), os, arch) {
            log::debug!("Skipping library due to rules: {}", library.name);
            continue;
        }

        if let Some(downloads) = &library.downloads {
            if let Some(artifact) = &downloads.artifact {
                match layout.library_path(&artifact.path) {
                    Ok(destination) => items.push(WorkItem {
                        name: library.name.clone(),
                        source_url: artifact.url.clone(),
                        destination,
                        expected_sha1: Some(artifact.sha1.clone()),
                        phase: Phase::Core,
                        size: Some(artifact.size),
                    }),
                    Err(e) => log::error!("{}", e),
                }
            }

            if let (Some(classifiers), Some(key)) = (
                downloads.classifiers.as_ref(),
                resolve_native_classifier(
                    library.natives.as_ref(),
                    downloads.classifiers.as_ref(),
                    os,
                    arch,
                ),
            ) {
                if let Some(native) = classifiers.get(&key) {
                    match layout.library_path(&native.path) {
                        Ok(destination) => items.push(WorkItem {
                            name: format!("{} ({})", library.name, key),
                            source_url: native.url.clone(),
                            destination,
                            expected_sha1: Some(native.sha1.clone()),
                            phase: Phase::Core,
                            size: Some(native.size),
                        }),
                        Err(e) => log::error!("{}", e),
                    }
                }
            }
        } else if let Some(base_url) = &library.url {
            // Legacy Maven-style entry: path derived from the coordinates,
            // no hash to verify against.
            match legacy_library_item(&library.name, base_url, layout) {
                Ok(item) => items.push(item),
                Err(e) => log::error!("Skipping legacy library {}: {}", library.name, e),
            }
        }
    }

    items
}

fn legacy_library_item(name: &str, base_url: &str, layout: &InstallLayout) -> Result<WorkItem> {
    let relative = maven_to_relative_path(name)?;
    let destination = layout.library_path(&relative)?;
    Ok(WorkItem {
        name: name.to_string(),
        source_url: format!("{}/{}", base_url.trim_end_matches('/'), relative),
        destination,
        expected_sha1: None,
        phase: Phase::Core,
        size: None,
    })
}

/// Work items for the resource phase, one per unique hash. Multiple virtual
/// paths sharing a hash resolve to the same content-addressed destination,
/// so duplicates are dropped up front instead of racing harmlessly.
pub fn resource_work_items(
    index: &AssetIndexFile,
    layout: &InstallLayout,
    resources_base_url: &str,
) -> Vec<WorkItem> {
    let base = resources_base_url.trim_end_matches('/');
    let mut entries: Vec<(&String, &crate::manifest::AssetObject)> =
        index.objects.iter().collect();
    // Stable order: two resolutions of the same index yield the same list.
    entries.sort_by(|a, b| a.1.hash.cmp(&b.1.hash).then_with(|| a.0.cmp(b.0)));

    let mut seen_hashes = HashSet::new();
    let mut items = Vec::new();
    for (virtual_path, object) in entries {
        if object.hash.len() < 2 || !object.hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            log::warn!(
                "Skipping asset {} with malformed hash {:?}",
                virtual_path,
                object.hash
            );
            continue;
        }
        if !seen_hashes.insert(object.hash.as_str()) {
            continue;
        }

        items.push(WorkItem {
            name: virtual_path.clone(),
            source_url: format!("{}/{}/{}", base, &object.hash[0..2], object.hash),
            destination: layout.asset_object_path(&object.hash),
            expected_sha1: Some(object.hash.clone()),
            phase: Phase::Resource,
            size: Some(object.size),
        });
    }

    items
}

/// Guard upheld for the whole run: no two work items may target the same
/// destination, otherwise concurrent writers could collide on a temp file.
pub fn assert_unique_destinations(items: &[WorkItem]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(&item.destination) {
            bail!(
                "duplicate destination in work list: {:?}",
                item.destination
            );
        }
    }
    Ok(())
}

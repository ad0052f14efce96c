//! Serde models for the version manifest and asset index wire formats.
//! The manifest arrives already parsed from the caller's metadata layer; the
//! asset index is fetched and parsed here during planning.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root descriptor for one version. Immutable once fetched; lifecycle is
/// fetch-once-per-install.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub id: String,
    pub asset_index: AssetIndexRef,
    pub downloads: Downloads,
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub logging: Option<Logging>,
    pub main_class: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    pub sha1: String,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub size: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Downloads {
    pub client: FileDescriptor,
}

/// URL + hash + size triple used for the main archive and logging config.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FileDescriptor {
    pub url: String,
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Logging {
    pub client: LoggingClient,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingClient {
    pub file: LoggingFile,
    #[serde(default)]
    pub argument: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingFile {
    pub id: String,
    pub url: String,
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Library {
    /// Maven coordinates, `group:artifact:version`.
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// Absent means unconditionally applicable; present (even empty) means
    /// the folded rule decision governs.
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    /// OS name -> native classifier key, possibly containing `${arch}`.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    /// Legacy Maven repository base URL; such entries carry no hash.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<Artifact>,
    #[serde(default)]
    pub classifiers: Option<HashMap<String, Artifact>>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Artifact {
    /// Relative path under the libraries directory.
    pub path: String,
    pub url: String,
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Rule {
    /// "allow" or "disallow".
    pub action: String,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

/// Flat mapping from virtual asset path to content hash + size.
#[derive(Deserialize, Serialize, Debug)]
pub struct AssetIndexFile {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

//! Deterministic on-disk layout under the installation root.
//!
//! ```text
//! <root>/versions/<id>/<id>.jar
//! <root>/versions/<id>/<loggingFileId>
//! <root>/libraries/<group>/<artifact>/<version>/<artifact>-<version>[-<classifier>].jar
//! <root>/assets/indexes/<assetIndexId>.json
//! <root>/assets/objects/<hash[0..2]>/<hash>
//! ```

use anyhow::{bail, Result};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions_dir().join(version_id)
    }

    pub fn client_jar_path(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{}.jar", version_id))
    }

    /// Logging config lives beside the main archive, named by its file id.
    pub fn logging_config_path(&self, version_id: &str, file_id: &str) -> PathBuf {
        self.version_dir(version_id).join(file_id)
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Join a manifest-supplied relative path under the libraries directory,
    /// rejecting absolute paths and parent-directory traversal.
    pub fn library_path(&self, relative: &str) -> Result<PathBuf> {
        let relative_path = Path::new(relative);
        if relative_path.is_absolute()
            || relative_path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            bail!("invalid library path from metadata: {}", relative);
        }
        Ok(self.libraries_dir().join(relative_path))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_index_path(&self, index_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{}.json", index_id))
    }

    /// Content-addressed object path: `assets/objects/<hash[0..2]>/<hash>`.
    /// Deduplicates automatically across versions that share assets.
    pub fn asset_object_path(&self, hash: &str) -> PathBuf {
        self.assets_dir()
            .join("objects")
            .join(&hash[0..2])
            .join(hash)
    }

    /// Create the directory skeleton for a version install. Idempotent and
    /// safe to race.
    pub fn ensure_skeleton(&self, version_id: &str) -> std::io::Result<()> {
        for dir in [
            self.versions_dir(),
            self.version_dir(version_id),
            self.libraries_dir(),
            self.assets_dir().join("indexes"),
            self.assets_dir().join("objects"),
        ] {
            std::fs::create_dir_all(&dir)?;
            log::debug!("Ensured directory: {:?}", dir);
        }
        Ok(())
    }
}

/// Map Maven coordinates `group:artifact:version[:classifier]` to the
/// repository-relative path
/// `group/with/slashes/artifact/version/artifact-version[-classifier].jar`.
pub fn maven_to_relative_path(coords: &str) -> Result<String> {
    let parts: Vec<&str> = coords.split(':').collect();
    let (group, artifact, version, classifier) = match parts.as_slice() {
        [group, artifact, version] => (*group, *artifact, *version, None),
        [group, artifact, version, classifier] => (*group, *artifact, *version, Some(*classifier)),
        _ => bail!("invalid maven coordinates: {}", coords),
    };
    if group.is_empty() || artifact.is_empty() || version.is_empty() {
        bail!("invalid maven coordinates: {}", coords);
    }

    let group_path = group.replace('.', "/");
    let file_name = match classifier {
        Some(classifier) => format!("{}-{}-{}.jar", artifact, version, classifier),
        None => format!("{}-{}.jar", artifact, version),
    };
    Ok(format!(
        "{}/{}/{}/{}",
        group_path, artifact, version, file_name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_versioned_layout() {
        let layout = InstallLayout::new("/data");

        assert_eq!(
            layout.client_jar_path("1.20.1"),
            PathBuf::from("/data/versions/1.20.1/1.20.1.jar")
        );
        assert_eq!(
            layout.logging_config_path("1.20.1", "client-1.12.xml"),
            PathBuf::from("/data/versions/1.20.1/client-1.12.xml")
        );
        assert_eq!(
            layout.asset_index_path("5"),
            PathBuf::from("/data/assets/indexes/5.json")
        );
        assert_eq!(
            layout.asset_object_path("1e9ae6bdd2b0e60b6d98d91b46b9adf1ed24d0f5"),
            PathBuf::from("/data/assets/objects/1e/1e9ae6bdd2b0e60b6d98d91b46b9adf1ed24d0f5")
        );
    }

    #[test]
    fn library_path_rejects_traversal() {
        let layout = InstallLayout::new("/data");

        assert!(layout.library_path("org/lwjgl/lwjgl-3.3.1.jar").is_ok());
        assert!(layout.library_path("../../etc/passwd").is_err());
        assert!(layout.library_path("/etc/passwd").is_err());
    }

    #[test]
    fn maven_coordinates_map_to_repository_paths() {
        assert_eq!(
            maven_to_relative_path("net.fabricmc:fabric-loader:0.15.7").unwrap(),
            "net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar"
        );
        assert_eq!(
            maven_to_relative_path("org.lwjgl:lwjgl:3.3.1:natives-linux").unwrap(),
            "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar"
        );
        assert!(maven_to_relative_path("not-coordinates").is_err());
        assert!(maven_to_relative_path("a:b").is_err());
    }

    #[test]
    fn skeleton_creation_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(tmp.path());

        layout.ensure_skeleton("1.20.1").unwrap();
        layout.ensure_skeleton("1.20.1").unwrap();

        assert!(layout.version_dir("1.20.1").is_dir());
        assert!(layout.assets_dir().join("objects").is_dir());
    }
}

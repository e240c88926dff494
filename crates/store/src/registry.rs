//! Local extension set discovery and package-file housekeeping.
//!
//! The registry is a plain directory of `.vsix` files, optionally described
//! by an `extensions.txt` manifest. Nothing here is persisted beyond the
//! package files themselves; the record set is rebuilt on every run.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::models::{ExtensionRecord, SourceMode};

/// Name of the flat manifest file listing `publisher.name@version` entries.
pub const MANIFEST_FILE: &str = "extensions.txt";

/// The directory holding installed extension packages.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    dir: PathBuf,
}

impl LocalRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the extension set using the given discovery mode.
    pub async fn load(&self, mode: SourceMode) -> Result<Vec<ExtensionRecord>> {
        match mode {
            SourceMode::Manifest => self.load_manifest().await,
            SourceMode::Scan => self.scan_packages().await,
        }
    }

    /// Read records from `extensions.txt`. Blank lines are ignored and
    /// malformed lines are logged and skipped; a missing file is an error.
    pub async fn load_manifest(&self) -> Result<Vec<ExtensionRecord>> {
        let path = self.dir.join(MANIFEST_FILE);
        debug!("loading manifest from {}", path.display());

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::ManifestNotFound(path));
            }
            Err(err) => {
                return Err(StoreError::IoOperation {
                    operation: "read manifest".to_string(),
                    path,
                    source: err,
                });
            }
        };

        let mut records = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match ExtensionRecord::from_manifest_line(line) {
                Ok(record) => records.push(record),
                Err(err) => warn!("skipping manifest line: {}", err),
            }
        }

        info!("loaded {} extensions from manifest", records.len());
        Ok(records)
    }

    /// Build records from the `.vsix` files present in the directory.
    /// Files that do not follow `publisher.name-version.vsix` are skipped.
    pub async fn scan_packages(&self) -> Result<Vec<ExtensionRecord>> {
        debug!("scanning {} for packages", self.dir.display());

        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|err| StoreError::IoOperation {
                operation: "read extension directory".to_string(),
                path: self.dir.clone(),
                source: err,
            })?;

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name();
            let filename = filename.to_string_lossy();
            if !filename.ends_with(".vsix") {
                continue;
            }
            match ExtensionRecord::from_package_filename(&filename) {
                Ok(record) => records.push(record),
                Err(err) => warn!("skipping package file: {}", err),
            }
        }

        info!("found {} extension packages", records.len());
        Ok(records)
    }

    /// Path of the package file for a record at a specific version.
    pub fn package_path(&self, record: &ExtensionRecord, version: &str) -> PathBuf {
        self.dir.join(record.package_filename_for(version))
    }

    /// Whether the package file for this record/version is already on disk.
    pub async fn has_package(&self, record: &ExtensionRecord, version: &str) -> bool {
        fs::try_exists(self.package_path(record, version))
            .await
            .unwrap_or(false)
    }

    /// Delete the package files of superseded records. Returns how many
    /// files were removed; per-file failures are logged and skipped.
    pub async fn remove_superseded(&self, records: &[ExtensionRecord]) -> u32 {
        let mut removed = 0;
        for record in records {
            let path = self.package_path(record, &record.version);
            match fs::remove_file(&path).await {
                Ok(()) => {
                    info!("deleted {}", record.package_filename());
                    removed += 1;
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    debug!("{} already gone", record.package_filename());
                }
                Err(err) => {
                    warn!("failed to delete {}: {}", path.display(), err);
                }
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn registry_with_files(files: &[&str]) -> (TempDir, LocalRegistry) {
        let temp_dir = TempDir::new().unwrap();
        for file in files {
            fs::write(temp_dir.path().join(file), b"fake package")
                .await
                .unwrap();
        }
        let registry = LocalRegistry::new(temp_dir.path());
        (temp_dir, registry)
    }

    #[tokio::test]
    async fn test_scan_skips_unparseable_files() {
        let (_temp_dir, registry) = registry_with_files(&[
            "foo.bar-1.2.3.vsix",
            "pub.ext-0.1.0.vsix",
            "README.md",
            "broken.vsix",
        ])
        .await;

        let mut records = registry.scan_packages().await.unwrap();
        records.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "foo.bar");
        assert_eq!(records[1].version, "0.1.0");
    }

    #[tokio::test]
    async fn test_manifest_loading() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(MANIFEST_FILE),
            "foo.bar@1.2.3\n\nnot a record\npub.ext@0.1.0\n",
        )
        .await
        .unwrap();

        let registry = LocalRegistry::new(temp_dir.path());
        let records = registry.load_manifest().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].publisher, "foo");
        assert_eq!(records[1].id, "pub.ext");
    }

    #[tokio::test]
    async fn test_missing_manifest_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let registry = LocalRegistry::new(temp_dir.path());

        let err = registry.load_manifest().await.unwrap_err();
        assert!(matches!(err, StoreError::ManifestNotFound(_)));
        assert!(err.is_user_error());
    }

    #[tokio::test]
    async fn test_has_package() {
        let (_temp_dir, registry) = registry_with_files(&["foo.bar-1.2.3.vsix"]).await;
        let record = ExtensionRecord::new("foo", "bar", "1.2.3");

        assert!(registry.has_package(&record, "1.2.3").await);
        assert!(!registry.has_package(&record, "2.0.0").await);
    }

    #[tokio::test]
    async fn test_remove_superseded() {
        let (temp_dir, registry) =
            registry_with_files(&["foo.bar-1.2.3.vsix", "pub.ext-0.1.0.vsix"]).await;

        let superseded = vec![
            ExtensionRecord::new("foo", "bar", "1.2.3"),
            // Not on disk; must not count or fail.
            ExtensionRecord::new("gone", "ext", "9.9.9"),
        ];

        let removed = registry.remove_superseded(&superseded).await;
        assert_eq!(removed, 1);
        assert!(!temp_dir.path().join("foo.bar-1.2.3.vsix").exists());
        assert!(temp_dir.path().join("pub.ext-0.1.0.vsix").exists());
    }
}

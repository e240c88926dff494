use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// A locally installed extension, identified by `publisher.name` plus the
/// version currently on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    /// Marketplace identifier, `publisher.name`.
    pub id: String,
    pub publisher: String,
    pub name: String,
    pub version: String,
}

impl ExtensionRecord {
    pub fn new(publisher: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        let publisher = publisher.into();
        let name = name.into();
        Self {
            id: format!("{}.{}", publisher, name),
            publisher,
            name,
            version: version.into(),
        }
    }

    /// Parse a manifest line of the form `publisher.name@version`.
    pub fn from_manifest_line(line: &str) -> Result<Self> {
        let line = line.trim();
        let (id, version) = line.split_once('@').ok_or_else(|| StoreError::InvalidRecord {
            input: line.to_string(),
            reason: "missing '@' separator".to_string(),
        })?;
        let (publisher, name) = id.split_once('.').ok_or_else(|| StoreError::InvalidRecord {
            input: line.to_string(),
            reason: "identifier is not of the form publisher.name".to_string(),
        })?;
        if publisher.is_empty() || name.is_empty() || version.is_empty() {
            return Err(StoreError::InvalidRecord {
                input: line.to_string(),
                reason: "empty publisher, name or version".to_string(),
            });
        }
        Ok(Self::new(publisher, name, version))
    }

    /// Parse a package filename of the form `publisher.name-version.vsix`.
    pub fn from_package_filename(filename: &str) -> Result<Self> {
        let stem = filename
            .strip_suffix(".vsix")
            .ok_or_else(|| StoreError::InvalidRecord {
                input: filename.to_string(),
                reason: "not a .vsix file".to_string(),
            })?;
        let (id, version) = stem.rsplit_once('-').ok_or_else(|| StoreError::InvalidRecord {
            input: filename.to_string(),
            reason: "missing '-' version separator".to_string(),
        })?;
        let (publisher, name) = id.split_once('.').ok_or_else(|| StoreError::InvalidRecord {
            input: filename.to_string(),
            reason: "identifier is not of the form publisher.name".to_string(),
        })?;
        if publisher.is_empty() || name.is_empty() || version.is_empty() {
            return Err(StoreError::InvalidRecord {
                input: filename.to_string(),
                reason: "empty publisher, name or version".to_string(),
            });
        }
        Ok(Self::new(publisher, name, version))
    }

    /// Filename of the package currently recorded for this extension.
    pub fn package_filename(&self) -> String {
        self.package_filename_for(&self.version)
    }

    /// Filename of the package at a specific version.
    pub fn package_filename_for(&self, version: &str) -> String {
        format!("{}-{}.vsix", self.id, version)
    }
}

/// Result of comparing an installed version against the marketplace.
#[derive(Debug, Clone)]
pub struct UpdateInfo {
    pub id: String,
    pub current_version: String,
    pub latest_version: String,
    pub update_available: bool,
}

impl UpdateInfo {
    /// Compare two semantic versions; `update_available` is true only when
    /// the latest version is strictly newer than the current one.
    pub fn new(id: impl Into<String>, current: &str, latest: &str) -> Result<Self> {
        let current_version = Version::parse(current)?;
        let latest_version = Version::parse(latest)?;

        Ok(Self {
            id: id.into(),
            current_version: current.to_string(),
            latest_version: latest.to_string(),
            update_available: latest_version > current_version,
        })
    }
}

/// How the local extension set is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Read `extensions.txt` from the extension directory.
    #[default]
    Manifest,
    /// Scan the extension directory for `*.vsix` files.
    Scan,
}

/// Options for a sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Consult the marketplace for the latest version of each extension
    /// instead of re-fetching the recorded version.
    pub check_updates: bool,
}

/// Accumulated outcome of one sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Extensions whose package was downloaded this pass.
    pub downloaded: Vec<ExtensionRecord>,
    /// Records (at their old version) whose package was replaced by a newer
    /// download and should be removed from disk.
    pub superseded: Vec<ExtensionRecord>,
    /// Extensions that could not be checked or downloaded.
    pub failed: Vec<ExtensionRecord>,
    /// Extensions whose package already existed on disk.
    pub skipped: Vec<ExtensionRecord>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.downloaded.len() + self.failed.len() + self.skipped.len()
    }
}

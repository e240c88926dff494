//! vsixup Store - offline VS Code extension package management
//!
//! This crate keeps a directory of `.vsix` packages in step with the Visual
//! Studio Marketplace: it discovers the installed set (from a manifest file
//! or a directory scan), checks for newer versions, downloads packages with
//! rate-limit aware retries, and removes superseded files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use vsixup_store::{LocalRegistry, MarketplaceClient, SourceMode, Updater};
//!
//! # async fn example() -> vsixup_store::Result<()> {
//! let headers = MarketplaceClient::load_headers(Path::new("headers.json")).await?;
//! let client = MarketplaceClient::new(headers)?;
//! let registry = LocalRegistry::new("./extensions");
//!
//! let records = registry.load(SourceMode::Manifest).await?;
//! let updater = Updater::new(client, registry);
//! let report = updater.sync(&records).await?;
//! println!("{} downloaded, {} failed", report.downloaded.len(), report.failed.len());
//! # Ok(())
//! # }
//! ```

pub mod download;
pub mod error;
pub mod marketplace;
pub mod models;
pub mod registry;
pub mod sync;

// Re-export commonly used types
pub use download::{download_package, DownloadedPackage, RetryConfig};
pub use error::{Result, StoreError};
pub use marketplace::{MarketplaceClient, DEFAULT_BASE_URL};
pub use models::{ExtensionRecord, SourceMode, SyncOptions, SyncReport, UpdateInfo};
pub use registry::{LocalRegistry, MANIFEST_FILE};
pub use sync::Updater;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "vsixup_store");
    }
}

//! Sequential update pipeline over the local extension set.
//!
//! Extensions are processed one at a time; the only suspension points are
//! network I/O and rate-limit backoff sleeps. Per-item failures are
//! recorded and skipped, never propagated out of a pass.

use tracing::{debug, error, info, warn};

use crate::download::{download_package, RetryConfig};
use crate::error::Result;
use crate::marketplace::MarketplaceClient;
use crate::models::{ExtensionRecord, SyncOptions, SyncReport, UpdateInfo};
use crate::registry::LocalRegistry;

enum ItemOutcome {
    Downloaded { superseded: bool },
    Skipped,
    Failed,
}

/// Drives update checking, downloading and stale-package cleanup.
pub struct Updater {
    client: MarketplaceClient,
    registry: LocalRegistry,
    retry: RetryConfig,
    options: SyncOptions,
}

impl Updater {
    pub fn new(client: MarketplaceClient, registry: LocalRegistry) -> Self {
        Self {
            client,
            registry,
            retry: RetryConfig::default(),
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn registry(&self) -> &LocalRegistry {
        &self.registry
    }

    /// Query the marketplace for every record and report which ones have a
    /// newer version. Lookup failures are logged and skipped.
    pub async fn check_updates(&self, records: &[ExtensionRecord]) -> Vec<UpdateInfo> {
        let mut updates = Vec::new();
        for record in records {
            match self.client.latest_version(&record.id).await {
                Ok(latest) => match UpdateInfo::new(record.id.as_str(), &record.version, &latest) {
                    Ok(info) => updates.push(info),
                    Err(err) => warn!("cannot compare versions for {}: {}", record.id, err),
                },
                Err(err) => warn!("{}", err),
            }
        }
        updates
    }

    /// Run one download pass over the records. Does not touch existing
    /// files beyond the downloads themselves; superseded packages are only
    /// collected, deletion happens in [`Updater::sync`].
    pub async fn process(&self, records: &[ExtensionRecord]) -> SyncReport {
        let mut report = SyncReport::default();

        for record in records {
            match self.process_one(record).await {
                ItemOutcome::Downloaded { superseded } => {
                    if superseded {
                        report.superseded.push(record.clone());
                    }
                    report.downloaded.push(record.clone());
                }
                ItemOutcome::Skipped => report.skipped.push(record.clone()),
                ItemOutcome::Failed => report.failed.push(record.clone()),
            }
        }

        report
    }

    /// Full pass: download what is missing, then delete superseded files.
    pub async fn sync(&self, records: &[ExtensionRecord]) -> Result<SyncReport> {
        let report = self.process(records).await;

        if !report.superseded.is_empty() {
            let removed = self.registry.remove_superseded(&report.superseded).await;
            debug!("removed {} superseded packages", removed);
        }

        info!(
            "sync finished: {} downloaded, {} skipped, {} failed",
            report.downloaded.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn process_one(&self, record: &ExtensionRecord) -> ItemOutcome {
        let mut desired_version = record.version.clone();
        let mut superseded = false;

        if self.options.check_updates {
            let latest = match self.client.latest_version(&record.id).await {
                Ok(latest) => latest,
                Err(err) => {
                    warn!("unable to fetch latest version for {}: {}", record.id, err);
                    return ItemOutcome::Failed;
                }
            };

            match UpdateInfo::new(record.id.as_str(), &record.version, &latest) {
                Ok(info) if info.update_available => {
                    info!("new version for {}: {} -> {}", record.id, record.version, latest);
                    superseded = true;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("cannot compare versions for {}: {}", record.id, err);
                    return ItemOutcome::Failed;
                }
            }

            desired_version = latest;
        }

        if self.registry.has_package(record, &desired_version).await {
            debug!(
                "{} already exists, skipping",
                record.package_filename_for(&desired_version)
            );
            return ItemOutcome::Skipped;
        }

        let url = self.client.package_url(record, &desired_version);
        let fallback = record.package_filename_for(&desired_version);

        match download_package(
            self.client.http(),
            &url,
            self.registry.dir(),
            &fallback,
            &self.retry,
        )
        .await
        {
            Ok(_) => ItemOutcome::Downloaded { superseded },
            Err(err) => {
                error!("failed to download {}: {}", record.id, err);
                ItemOutcome::Failed
            }
        }
    }
}

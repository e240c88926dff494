use std::path::PathBuf;

use eyre::Result;
use vsixup_store::{LocalRegistry, SyncOptions, SyncReport, Updater};

use crate::cli::SourceArg;
use crate::config::Config;
use crate::utils::{
    confirm, create_marketplace_client, load_records, resolve_directory, resolve_source,
};

pub async fn handle_sync_command(
    config: &Config,
    update: bool,
    source: Option<SourceArg>,
    dir: Option<PathBuf>,
    yes: bool,
) -> Result<()> {
    let directory = resolve_directory(dir, config);
    let mode = resolve_source(source, config)?;

    let client = create_marketplace_client(config).await?;
    let registry = LocalRegistry::new(&directory);
    let records = load_records(&registry, mode).await?;

    if records.is_empty() {
        println!("📦 No extensions found in {}", directory.display());
        return Ok(());
    }

    println!("🔄 Syncing {} extensions...", records.len());
    let updater = Updater::new(client, registry).with_options(SyncOptions {
        check_updates: update,
    });

    let report = updater.sync(&records).await?;
    print_report(&report);

    if !report.failed.is_empty() {
        let retry = yes || confirm("Retry failed downloads?")?;
        if retry {
            println!("🔄 Retrying {} failed downloads...", report.failed.len());
            let retry_report = updater.sync(&report.failed).await?;
            print_report(&retry_report);

            if !retry_report.is_clean() {
                return Err(eyre::eyre!(
                    "{} extensions could not be downloaded",
                    retry_report.failed.len()
                ));
            }
        } else {
            return Err(eyre::eyre!(
                "{} extensions could not be downloaded",
                report.failed.len()
            ));
        }
    }

    Ok(())
}

fn print_report(report: &SyncReport) {
    for record in &report.downloaded {
        println!("✅ Downloaded {}", record.id);
    }
    for record in &report.skipped {
        println!("⏭️ {} already up to date", record.package_filename());
    }
    for record in &report.superseded {
        println!("🗑️ Removed {}", record.package_filename());
    }
    for record in &report.failed {
        println!("❌ Failed {}", record.id);
    }
}

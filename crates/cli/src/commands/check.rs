use std::path::PathBuf;

use eyre::Result;
use vsixup_store::{LocalRegistry, Updater};

use crate::cli::SourceArg;
use crate::config::Config;
use crate::utils::{create_marketplace_client, load_records, resolve_directory, resolve_source};

pub async fn handle_check_command(
    config: &Config,
    source: Option<SourceArg>,
    dir: Option<PathBuf>,
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

    println!("🔍 Checking {} extensions for updates...", records.len());
    let updater = Updater::new(client, registry);
    let updates = updater.check_updates(&records).await;

    let mut available = 0;
    for info in &updates {
        if info.update_available {
            println!(
                "📦 {}: {} → {}",
                info.id, info.current_version, info.latest_version
            );
            available += 1;
        }
    }

    if available == 0 {
        println!("✅ Everything is up to date");
    } else {
        println!("💡 Run 'vsixup sync --update' to download {} updates", available);
    }

    if updates.len() < records.len() {
        println!(
            "⚠️ {} extensions could not be checked",
            records.len() - updates.len()
        );
    }

    Ok(())
}

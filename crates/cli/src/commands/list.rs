use std::path::PathBuf;

use eyre::Result;
use vsixup_store::LocalRegistry;

use crate::cli::SourceArg;
use crate::config::Config;
use crate::utils::{load_records, resolve_directory, resolve_source};

pub async fn handle_list_command(
    config: &Config,
    source: Option<SourceArg>,
    dir: Option<PathBuf>,
    detailed: bool,
) -> Result<()> {
    let directory = resolve_directory(dir, config);
    let mode = resolve_source(source, config)?;

    let registry = LocalRegistry::new(&directory);
    let records = load_records(&registry, mode).await?;

    if records.is_empty() {
        println!("📦 No extensions found in {}", directory.display());
        return Ok(());
    }

    println!("📦 Extensions ({}):", records.len());
    for record in records {
        if detailed {
            println!("  📦 {} v{}", record.id, record.version);
            println!("     Publisher: {}", record.publisher);
            println!("     Name: {}", record.name);
            println!("     Package: {}", record.package_filename());
            println!();
        } else {
            println!("  📦 {} v{}", record.id, record.version);
        }
    }

    Ok(())
}

//! Shared plumbing for command handlers.

use std::io::{self, Write};
use std::path::PathBuf;

use eyre::Result;
use vsixup_store::{ExtensionRecord, LocalRegistry, MarketplaceClient, SourceMode};

use crate::cli::SourceArg;
use crate::config::Config;

/// Pick the extension directory: CLI flag first, configured default second.
pub fn resolve_directory(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from(&config.directory))
}

/// Pick the discovery mode: CLI flag first, configured default second.
pub fn resolve_source(flag: Option<SourceArg>, config: &Config) -> Result<SourceMode> {
    match flag {
        Some(SourceArg::File) => Ok(SourceMode::Manifest),
        Some(SourceArg::Dir) => Ok(SourceMode::Scan),
        None => match config.source.as_str() {
            "file" => Ok(SourceMode::Manifest),
            "dir" => Ok(SourceMode::Scan),
            other => Err(eyre::eyre!(
                "Invalid configured source '{}': expected file or dir",
                other
            )),
        },
    }
}

/// Build a marketplace client from the configured header file. A missing
/// header file is a setup error and aborts the run.
pub async fn create_marketplace_client(config: &Config) -> Result<MarketplaceClient> {
    let headers_path = config.headers_path();
    let headers = MarketplaceClient::load_headers(&headers_path)
        .await
        .map_err(|err| {
            eyre::eyre!(
                "{err}\n💡 Create '{}' with a JSON map of request headers",
                headers_path.display()
            )
        })?;
    MarketplaceClient::new(headers).map_err(eyre::Report::from)
}

/// Load the extension set for the resolved directory and mode.
pub async fn load_records(
    registry: &LocalRegistry,
    mode: SourceMode,
) -> Result<Vec<ExtensionRecord>> {
    registry.load(mode).await.map_err(eyre::Report::from)
}

/// Ask a y/N question on stdin.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{} (y/N): ", question);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase().starts_with('y'))
}

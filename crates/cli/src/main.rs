mod cli;
mod commands;
mod config;
mod utils;

use clap::Parser;

use crate::cli::Commands;
use crate::commands::{
    handle_check_command, handle_config_command, handle_list_command, handle_sync_command,
};
use crate::config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load().await?;
    tracing::debug!(
        "configuration loaded from {}",
        Config::get_config_path().display()
    );

    match cli.command {
        Commands::Sync {
            update,
            source,
            dir,
            yes,
        } => {
            handle_sync_command(&config, update, source, dir, yes).await?;
        }
        Commands::Check { source, dir } => {
            handle_check_command(&config, source, dir).await?;
        }
        Commands::List {
            source,
            dir,
            detailed,
        } => {
            handle_list_command(&config, source, dir, detailed).await?;
        }
        Commands::Config { command } => {
            handle_config_command(command).await?;
        }
    }

    Ok(())
}

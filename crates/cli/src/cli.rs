use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(name = "vsixup", version, about = "Keep a directory of .vsix packages up to date")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Download missing or updated packages and remove superseded ones
    Sync {
        /// Check the marketplace for newer versions instead of re-fetching
        /// the recorded ones
        #[clap(long)]
        update: bool,
        /// Where the extension set comes from
        #[clap(long, value_enum)]
        source: Option<SourceArg>,
        /// Extension directory (overrides the configured one)
        #[clap(long)]
        dir: Option<PathBuf>,
        /// Retry failed downloads without asking
        #[clap(long, short = 'y')]
        yes: bool,
    },
    /// Check the marketplace for newer versions without downloading
    Check {
        #[clap(long, value_enum)]
        source: Option<SourceArg>,
        #[clap(long)]
        dir: Option<PathBuf>,
    },
    /// List the extensions parsed from the manifest or directory
    List {
        #[clap(long, value_enum)]
        source: Option<SourceArg>,
        #[clap(long)]
        dir: Option<PathBuf>,
        /// Show publisher, name and version separately
        #[clap(long)]
        detailed: bool,
    },
    /// Manage configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the full configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum SourceArg {
    /// Read extensions.txt from the extension directory
    File,
    /// Scan the extension directory for .vsix files
    Dir,
}

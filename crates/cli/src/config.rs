use std::path::PathBuf;

use directories::ProjectDirs;
use eyre::Result;
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Persistent run defaults; every field can be overridden per run with a
/// CLI flag.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the .vsix packages (and extensions.txt).
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Extension set source: "file" or "dir".
    #[serde(default = "default_source")]
    pub source: String,
    /// Path of the JSON request-header file. Defaults to headers.json next
    /// to the configuration file.
    #[serde(default)]
    pub headers: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            source: default_source(),
            headers: None,
        }
    }
}

fn default_directory() -> String {
    ".".to_string()
}

fn default_source() -> String {
    "file".to_string()
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        get_default_config_dir().join("config.json")
    }

    /// Resolved header-config path: the configured one, or headers.json in
    /// the configuration directory.
    pub fn headers_path(&self) -> PathBuf {
        match &self.headers {
            Some(path) => PathBuf::from(path),
            None => get_default_config_dir().join("headers.json"),
        }
    }

    pub async fn load() -> Result<Self> {
        let config_path = Self::get_config_path();

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save().await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "directory" => {
                self.directory = value.to_string();
            }
            "source" => {
                if value != "file" && value != "dir" {
                    return Err(eyre::eyre!("Invalid source '{}': expected file or dir", value));
                }
                self.source = value.to_string();
            }
            "headers" => {
                self.headers = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "directory" => self.directory.clone(),
            "source" => self.source.clone(),
            "headers" => self.headers.clone().unwrap_or_default(),
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        };

        Ok(value)
    }

    pub fn show_all(&self) -> String {
        format!(
            "Configuration:\n\
             ├─ directory: {}\n\
             ├─ source: {}\n\
             └─ headers: {}",
            self.directory,
            self.source,
            self.headers.as_deref().unwrap_or("(default)"),
        )
    }
}

/// Get the default configuration directory
fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "vsixup", "vsixup") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        // Fallback to current directory if we can't determine project dirs
        PathBuf::from(".vsixup").join("config")
    }
}

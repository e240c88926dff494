use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Rate limited on '{url}': gave up after {attempts} attempts")]
    RateLimitExhausted { url: String, attempts: u32 },

    #[error("Unexpected HTTP status {status} for '{url}'")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("IO operation '{operation}' failed on path '{path}': {source}")]
    IoOperation {
        operation: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Manifest not found at '{0}' (ensure extensions.txt exists in the extension directory)")]
    ManifestNotFound(PathBuf),

    #[error("Invalid extension record '{input}': {reason}")]
    InvalidRecord { input: String, reason: String },

    #[error("Invalid version format: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Version lookup failed for '{0}'")]
    VersionLookupFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Whether a later attempt at the same operation could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::NetworkError(_)
                | StoreError::RateLimitExhausted { .. }
                | StoreError::VersionLookupFailed(_)
        )
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            StoreError::ConfigError(_)
                | StoreError::ManifestNotFound(_)
                | StoreError::InvalidRecord { .. }
                | StoreError::InvalidVersion(_)
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::NetworkError(err.to_string())
    }
}

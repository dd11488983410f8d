//! Error types for the varnishcache CLI

use thiserror::Error;

/// Result type alias for varnishcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Purge(#[from] PurgeError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings persistence errors.
///
/// An unreadable or corrupt settings file is never an error: loading falls
/// back to defaults instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Permission denied writing settings: {0}")]
    PermissionDenied(String),

    #[error("Failed to write settings: {0}")]
    Io(String),

    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    #[error("Could not determine home directory")]
    NoHome,
}

impl ConfigError {
    /// Classify an I/O failure that happened while saving.
    pub fn from_write(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied(err.to_string()),
            _ => ConfigError::Io(err.to_string()),
        }
    }
}

/// Reasons a purge did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurgeError {
    #[error("no server configured")]
    NoServerConfigured,

    #[error("{0}")]
    Transport(String),

    #[error("HTTP Status Code: {0}")]
    NonSuccessStatus(u16),

    #[error("Failed to determine current host")]
    HostUndetermined,
}

impl From<reqwest::Error> for PurgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PurgeError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            PurgeError::Transport(format!("Failed to connect to cache server: {}", err))
        } else {
            PurgeError::Transport(err.to_string())
        }
    }
}

/// Administrative authorization failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access denied. You do not have permission to manage cache settings.")]
    InsufficientPrivilege,

    #[error("Access denied. Security check failed: invalid or expired token.")]
    InvalidToken,

    #[error("Failed to access token store: {0}")]
    Store(String),
}

/// Schedule book persistence errors
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Failed to write schedule: {0}")]
    Write(String),

    #[error("Failed to serialize schedule: {0}")]
    Serialize(String),
}

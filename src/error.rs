//! Error types for typed error handling.
//!
//! This module provides structured errors for the supervisor, enabling
//! callers to distinguish recoverable conditions (a missing configuration
//! key) from fatal ones (an I/O failure mid-mutation).

use std::path::PathBuf;

/// Result type for supervisor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Supervisor errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The server control binary exited with a nonzero status.
    ///
    /// Carries the captured stderr, falling back to stdout when stderr
    /// was empty.
    #[error("`{command}` failed: {message}")]
    ProcessExit { command: String, message: String },

    /// The server control binary could not be spawned at all.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// No uncommented assignment for the key exists in the config file.
    ///
    /// Recoverable: callers wanting a default absorb this via
    /// [`get_or`](crate::properties::ConfigStore::get_or) or the endpoint
    /// fallbacks.
    #[error("configuration key `{key}` not found")]
    KeyNotFound { key: String },

    /// Reading or writing the configuration file failed.
    #[error("config file error at {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Wiping or recreating the data directory failed.
    #[error("filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The server never accepted an HTTP connection within the probe budget.
    #[error("server did not attach at {url} after {attempts} attempts")]
    AttachTimeout { url: String, attempts: u32 },

    /// The declared server version is not valid semver.
    #[error("invalid server version: {0}")]
    Version(#[from] semver::Error),
}

impl Error {
    /// Create a process exit error.
    pub fn process_exit(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProcessExit {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a spawn error.
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create a key not found error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create a config I/O error.
    pub fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }

    /// Create a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// True when the error is a recoverable missing-key condition.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

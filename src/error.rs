//! Error types for the sync engine.
//!
//! `RemoteError` covers everything the dashboard server can answer with,
//! `SyncError` is the crate-level error that the pass and daemon report.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the remote dashboard server or the transport to it.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Conflict ({status}): {body}")]
    Conflict { status: u16, body: String },

    #[error("Unauthorized ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Not found ({status}): {body}")]
    NotFound { status: u16, body: String },

    #[error("Remote API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Classify a non-success HTTP status into the matching variant.
    ///
    /// 409 and 412 are what the server answers when a folder with the same
    /// name already exists under the requested parent.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            409 | 412 => RemoteError::Conflict { status, body },
            401 | 403 => RemoteError::Unauthorized { status, body },
            404 => RemoteError::NotFound { status, body },
            _ => RemoteError::Status { status, body },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }

    /// Network failures and 5xx answers, retried on the next poll cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Transport(_) => true,
            RemoteError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

/// Crate-level errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Source error: {0}")]
    Source(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid artifact {path:?}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("Folder could not be resolved: {path}")]
    FolderUnresolved { path: String },

    #[error("Startup failed: {0}")]
    Startup(String),
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigError(err.to_string())
    }
}

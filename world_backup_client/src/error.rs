/**
 * Error types for the backup client
 *
 * `WorldError` is what the world adapter reports for a single remote call.
 * `BackupError` is what stops a run: a failed stage, or backup persistence
 * that cannot continue safely.
 */
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::stages::Stage;

/// Failure reported by the world server adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// Underlying SDK error with message
    #[error("SDK error: {0}")]
    Sdk(String),
    /// Object, world or citizen not found
    #[error("not found: {0}")]
    NotFound(String),
    /// Call not valid in the current session state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Classify a plain SDK message
impl From<String> for WorldError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("not found") {
            WorldError::NotFound(s)
        } else if lower.contains("network") || lower.contains("connection") {
            WorldError::Network(s)
        } else {
            WorldError::Sdk(s)
        }
    }
}

impl From<&str> for WorldError {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

/// Fatal error ending a run
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("cannot connect to world server: {0}")]
    Connect(#[source] WorldError),
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: WorldError,
    },
    #[error("cannot open backup file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write backup file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unreadable record at line {line} of {}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

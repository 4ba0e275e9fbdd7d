use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use world_backup_common::{codec, ObjectRecord};

/// Mutation attempted on a world object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Add,
    Delete,
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attempt::Add => write!(f, "add"),
            Attempt::Delete => write!(f, "delete"),
        }
    }
}

/// Optional plain-text trail of every attempted mutation. Diagnostic only;
/// a failed write is logged and otherwise ignored.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn record(&self, attempt: Attempt, record: &ObjectRecord) {
        let Some(path) = &self.path else { return };
        let line = format!(
            "{} Attempting to {} {}",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            attempt,
            codec::encode(record)
        );
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = written {
            log::warn!("Failed to write activity log {}: {}", path.display(), e);
        }
    }
}

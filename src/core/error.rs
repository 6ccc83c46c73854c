/// Errors raised by the retention core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("Invalid retention spec '{spec}': {reason}")]
    InvalidRetentionSpec { spec: String, reason: String },

    #[error("Backup directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Non-fatal: the file is still listed, just not classified
    #[error("No YYYY-MM-DD[_HH-MM] timestamp in file name: {0}")]
    MalformedFilename(String),

    #[error("Invalid archive pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RetentionError {
    pub(crate) fn invalid_spec(spec: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRetentionSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

//! Error types for steptimer

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by configuration loading and summary export
///
/// Failures of a measured region are never wrapped in this type; they are
/// handed back to the caller exactly as the region produced them.
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timer configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl TimerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TimerError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TimerError>;

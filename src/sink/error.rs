//! Error types for sinks

use std::io;
use std::path::PathBuf;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors that can occur while building or writing to a sink
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The initial log file could not be opened; no sink was built
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing or flushing a record failed
    #[error("failed to write to log file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An earlier roll could not open its new file
    #[error("log file rotation to {path} failed: {source}")]
    Rotation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The background roll timer could not be started; no sink was built
    #[error("failed to start the roll timer for {path}: {source}")]
    Timer {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The sink was closed
    #[error("log sink for {path} is closed")]
    Closed { path: PathBuf },

    /// The event could not be rendered as JSON
    #[error("failed to encode event as JSON: {0}")]
    Encode(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SinkError {
    /// The file this error concerns, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            SinkError::Open { path, .. }
            | SinkError::Write { path, .. }
            | SinkError::Rotation { path, .. }
            | SinkError::Timer { path, .. }
            | SinkError::Closed { path } => Some(path),
            SinkError::Encode(_) | SinkError::Config(_) => None,
        }
    }
}

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Failures tied to a single track source. Always recoverable at the batch
/// level: the track is skipped and the error recorded.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("failed to parse {format} track: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("timestamps go backwards at point {index}")]
    UnorderedTimestamps { index: usize },
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrackError {
    pub fn parse(format: &'static str, message: impl Into<String>) -> Self {
        TrackError::Parse {
            format,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackError::Parse { .. } | TrackError::UnorderedTimestamps { .. } => ErrorKind::Parse,
            TrackError::InsufficientData(_) => ErrorKind::InsufficientData,
            TrackError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Invalid configuration. Carries every problem found, not just the first.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid configuration: {}", errors.join("; "))]
pub struct ConfigurationError {
    pub errors: Vec<String>,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

/// Any failure on the way from a loaded track to a label.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl ClassifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifyError::Track(e) => e.kind(),
            ClassifyError::Configuration(_) => ErrorKind::Configuration,
        }
    }
}

/// Error category as reported in batch output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    InsufficientData,
    Io,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::InsufficientData => "insufficient_data",
            ErrorKind::Io => "io",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

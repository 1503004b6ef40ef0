//! Error types for wordfreq.
//!
//! Errors fall into two groups. Run-level errors (discovery, configuration,
//! pattern compilation, timeouts, writing the report) abort an analysis and are
//! returned through `?`. Chunk- and file-level errors (open, read, decode,
//! oversized tokens) travel through the pipeline as `Err` values next to the
//! data, are logged by the aggregator, and end up in
//! [`AnalysisReport::failures`](crate::results::AnalysisReport) without
//! stopping the run.
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Result type for analysis operations
pub type FreqResult<T> = Result<T, FreqError>;

/// Errors that can occur while analyzing word frequencies
#[derive(Error, Debug)]
pub enum FreqError {
    #[error("Failed to discover input files in {path}: {message}")]
    Discovery { path: PathBuf, message: String },
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Failed to open {path}: {source}")]
    FileOpen { path: PathBuf, source: io::Error },
    #[error("Read error in {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Token in {path} exceeds the maximum length of {limit} bytes")]
    TokenTooLong { path: PathBuf, limit: usize },
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::str::Utf8Error,
    },
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Failed to write results to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Analysis timed out after {}", display_duration(.0))]
    Timeout(Duration),
    #[error("Pipeline stage {0} panicked")]
    StagePanicked(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

fn display_duration(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

impl FreqError {
    pub fn discovery(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Discovery {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classifies a failure to open an input file
    pub fn file_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::FileOpen { path, source },
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn token_too_long(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self::TokenTooLong {
            path: path.into(),
            limit,
        }
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// The input file this error is attributed to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::FileNotFound(path) | Self::PermissionDenied(path) => Some(path),
            Self::FileOpen { path, .. }
            | Self::Read { path, .. }
            | Self::TokenTooLong { path, .. }
            | Self::EncodingError { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether the error is confined to a single file or chunk and the run may continue
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::PermissionDenied(_)
                | Self::FileOpen { .. }
                | Self::Read { .. }
                | Self::TokenTooLong { .. }
                | Self::EncodingError { .. }
        )
    }
}

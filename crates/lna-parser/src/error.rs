//! Error types for LNA binary decoding.

use std::path::PathBuf;

use lidar_common::LidarError;
use lidar_processing::ProcessingError;
use thiserror::Error;

/// Result type alias using LnaError.
pub type LnaResult<T> = Result<T, LnaError>;

#[derive(Debug, Error)]
pub enum LnaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid ASCII preamble: {0}")]
    InvalidPreamble(String),

    #[error("Truncated {section}: need {needed} bytes, {available} available")]
    Truncated {
        section: String,
        needed: usize,
        available: usize,
    },

    #[error("Invalid acquisition header: {0}")]
    InvalidHeader(String),

    #[error("Invalid timestamp in profile {profile}: {reason}")]
    InvalidTimestamp { profile: usize, reason: String },

    #[error("Channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Model(#[from] LidarError),

    #[error("{}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<LnaError>,
    },
}

impl LnaError {
    /// Attach the path of the file being decoded.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            already @ LnaError::InFile { .. } => already,
            other => LnaError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The error without its file context.
    pub fn root(&self) -> &LnaError {
        match self {
            LnaError::InFile { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the file ended before the header said it would.
    pub fn is_truncated(&self) -> bool {
        match self {
            LnaError::Truncated { .. } => true,
            LnaError::InFile { source, .. } => source.is_truncated(),
            _ => false,
        }
    }
}

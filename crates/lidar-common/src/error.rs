//! Error types shared by the lidar crates.

use thiserror::Error;

/// Result type alias using LidarError.
pub type LidarResult<T> = Result<T, LidarError>;

/// Primary error type for the data model and the format catalog.
#[derive(Debug, Error)]
pub enum LidarError {
    // === Configuration Errors ===
    #[error("Format catalog error: {0}")]
    Config(String),

    // === Data Model Errors ===
    #[error("Channel '{channel}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        channel: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Channel '{0}' already exists in dataset")]
    DuplicateChannel(String),

    #[error("Buffer holds {found} values, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Invalid date or time: {0}")]
    InvalidTime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LidarError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an InvalidTime error.
    pub fn invalid_time(msg: impl Into<String>) -> Self {
        Self::InvalidTime(msg.into())
    }

    /// True for errors caused by the catalog resource rather than data.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

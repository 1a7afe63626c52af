//! Error types for lidar processing.

use lidar_common::LidarError;
use thiserror::Error;

/// Errors that can occur while correcting, merging or regridding datasets.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Two datasets cannot be combined without truncating or padding samples.
    #[error("merge inconsistency: {0}")]
    MergeInconsistency(String),

    /// Operand arrays of an elementwise operation differ in shape.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Data model invariant violated.
    #[error(transparent)]
    Model(#[from] LidarError),
}

impl ProcessingError {
    /// Create a MergeInconsistency error.
    pub fn merge_inconsistency(msg: impl Into<String>) -> Self {
        Self::MergeInconsistency(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }
}

/// Result type for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

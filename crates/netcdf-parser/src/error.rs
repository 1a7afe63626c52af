//! Error types for columnar lidar decoding.

use std::path::PathBuf;

use lidar_common::LidarError;
use lidar_processing::ProcessingError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// File could not be opened or a variable could not be read
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// A channel variable is not laid out as (time, altitude)
    #[error("Variable '{variable}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        variable: String,
        expected: (usize, usize),
        found: Vec<usize>,
    },

    /// Format identifier absent from the catalog
    #[error("Unknown columnar format '{0}'")]
    UnknownFormat(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Model(#[from] LidarError),

    #[error("{}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<NetCdfError>,
    },
}

impl NetCdfError {
    /// Attach the path of the file being decoded.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            already @ NetCdfError::InFile { .. } => already,
            other => NetCdfError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The error without its file context.
    pub fn root(&self) -> &NetCdfError {
        match self {
            NetCdfError::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}

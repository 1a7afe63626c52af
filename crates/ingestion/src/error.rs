//! Error types for the ingestion crate.
//!
//! These are the errors a caller shows to a person, so the format-related
//! ones carry the list of supported formats.

use std::path::PathBuf;

use lidar_common::LidarError;
use lidar_processing::ProcessingError;
use lna_parser::LnaError;
use netcdf_parser::NetCdfError;
use thiserror::Error;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "No recognizable lidar files in {}. Supported formats: {}",
        .path.display(),
        .supported.join(", ")
    )]
    NoRecognizableFiles {
        path: PathBuf,
        supported: Vec<String>,
    },

    #[error(
        "Unrecognized file format: {}. Supported formats: {}",
        .path.display(),
        .supported.join(", ")
    )]
    UnrecognizedFormat {
        path: PathBuf,
        supported: Vec<String>,
    },

    #[error(
        "Failed to decode {}: {message}. Supported formats: {}",
        .path.display(),
        .supported.join(", ")
    )]
    DecodeFailed {
        path: PathBuf,
        message: String,
        supported: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Files cannot be merged: {0}")]
    MergeInconsistency(String),

    #[error("Failed to process dataset: {0}")]
    Processing(String),
}

impl IngestionError {
    /// Formats listed by the error, if it is about an unsupported or
    /// undecodable source.
    pub fn supported_formats(&self) -> Option<&[String]> {
        match self {
            IngestionError::NoRecognizableFiles { supported, .. }
            | IngestionError::UnrecognizedFormat { supported, .. }
            | IngestionError::DecodeFailed { supported, .. } => Some(supported.as_slice()),
            _ => None,
        }
    }

    /// Attach `path` to filesystem failures; other errors convert as usual.
    pub(crate) fn from_lidar(path: &std::path::Path, error: LidarError) -> Self {
        match error {
            LidarError::Io(source) => IngestionError::FileRead {
                path: path.to_path_buf(),
                source,
            },
            other => other.into(),
        }
    }

    pub(crate) fn from_lna(path: &std::path::Path, error: LnaError, supported: Vec<String>) -> Self {
        match error.root() {
            LnaError::Processing(ProcessingError::MergeInconsistency(msg)) => {
                IngestionError::MergeInconsistency(msg.clone())
            }
            _ => IngestionError::DecodeFailed {
                path: path.to_path_buf(),
                message: error.to_string(),
                supported,
            },
        }
    }

    pub(crate) fn from_netcdf(
        path: &std::path::Path,
        error: NetCdfError,
        supported: Vec<String>,
    ) -> Self {
        match error.root() {
            NetCdfError::Processing(ProcessingError::MergeInconsistency(msg)) => {
                IngestionError::MergeInconsistency(msg.clone())
            }
            _ => IngestionError::DecodeFailed {
                path: path.to_path_buf(),
                message: error.to_string(),
                supported,
            },
        }
    }
}

impl From<LidarError> for IngestionError {
    fn from(e: LidarError) -> Self {
        match e {
            LidarError::Config(msg) => IngestionError::Config(msg),
            other => IngestionError::Processing(other.to_string()),
        }
    }
}

impl From<ProcessingError> for IngestionError {
    fn from(e: ProcessingError) -> Self {
        match e {
            ProcessingError::MergeInconsistency(msg) => IngestionError::MergeInconsistency(msg),
            ProcessingError::ConfigError(msg) => IngestionError::Config(msg),
            other => IngestionError::Processing(other.to_string()),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_lists_supported_formats() {
        let err = IngestionError::UnrecognizedFormat {
            path: PathBuf::from("/data/readme.txt"),
            supported: vec!["lna binary".to_string(), "als450".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/readme.txt"));
        assert!(msg.ends_with("lna binary, als450"));
        assert_eq!(err.supported_formats().unwrap().len(), 2);
    }

    #[test]
    fn test_merge_errors_keep_their_kind() {
        let lna = LnaError::Processing(ProcessingError::merge_inconsistency("bins differ"));
        let err = IngestionError::from_lna(std::path::Path::new("/data"), lna, Vec::new());
        assert!(matches!(err, IngestionError::MergeInconsistency(_)));

        let err: IngestionError = ProcessingError::merge_inconsistency("bins differ").into();
        assert!(matches!(err, IngestionError::MergeInconsistency(_)));
        assert!(err.supported_formats().is_none());
    }

    #[test]
    fn test_shape_errors_are_not_merge_errors() {
        let err: IngestionError = ProcessingError::shape_mismatch("3 vs 4 bins").into();
        assert!(matches!(err, IngestionError::Processing(_)));

        let err: IngestionError = LidarError::DuplicateChannel("p01".to_string()).into();
        assert!(matches!(err, IngestionError::Processing(_)));

        let err: IngestionError = LidarError::config("missing 'vertical'").into();
        assert!(matches!(err, IngestionError::Config(_)));
    }

    #[test]
    fn test_listing_failure_is_file_read() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = IngestionError::from_lidar(std::path::Path::new("/data/campaign"), LidarError::Io(denied));
        match &err {
            IngestionError::FileRead { path, source } => {
                assert_eq!(path, std::path::Path::new("/data/campaign"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().starts_with("Failed to read /data/campaign"));
    }
}

//! Source classification from file names.
//!
//! Binary instrument files are recognised by their fixed prefix. Columnar
//! files carry their format identifier as the first `_`-separated token of
//! the file name, which must be a format known to the catalog.

use std::path::{Path, PathBuf};

use lidar_common::{list_files, FormatCatalog};
use lidar_processing::sort_paths;
use lna_parser::is_lna_file_name;
use netcdf_parser::FILE_EXTENSION as NETCDF_EXTENSION;
use serde::Serialize;
use tracing::debug;

use crate::error::{IngestionError, Result};

/// Detected file type based on the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileType {
    /// LNA vendor binary (`lna_0a_raw*.dat`)
    LnaBinary,
    /// Columnar file of a catalog format
    NetCdf { format_id: String },
    /// Unknown format
    Unknown,
}

impl FileType {
    pub fn is_known(&self) -> bool {
        !matches!(self, FileType::Unknown)
    }
}

/// What a source path points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceKind {
    pub is_folder: bool,
    pub file_type: FileType,
}

/// Detect file type from a file name (not a full path).
pub fn detect_file_type(name: &str, catalog: &FormatCatalog) -> FileType {
    if is_lna_file_name(name) {
        return FileType::LnaBinary;
    }

    let lower = name.to_lowercase();
    let Some(stem) = lower.strip_suffix(NETCDF_EXTENSION) else {
        return FileType::Unknown;
    };
    let token = stem.split('_').next().unwrap_or(stem);
    if catalog.is_supported(token) {
        FileType::NetCdf {
            format_id: token.to_string(),
        }
    } else {
        FileType::Unknown
    }
}

/// Human-readable list of the formats that can be opened.
pub fn supported_formats(catalog: &FormatCatalog) -> Vec<String> {
    let mut formats = vec!["LNA binary (lna_0a_raw*.dat)".to_string()];
    formats.extend(
        catalog
            .supported_formats()
            .into_iter()
            .map(|id| format!("{} ({}_*{})", id, id, NETCDF_EXTENSION)),
    );
    formats
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Classify a file or folder.
///
/// A folder takes the type of its first recognizable file in file name
/// order.
pub fn classify_source(path: &Path, catalog: &FormatCatalog) -> Result<SourceKind> {
    let meta = std::fs::metadata(path).map_err(|source| IngestionError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    if !meta.is_dir() {
        let file_type = detect_file_type(file_name(path), catalog);
        if !file_type.is_known() {
            return Err(IngestionError::UnrecognizedFormat {
                path: path.to_path_buf(),
                supported: supported_formats(catalog),
            });
        }
        return Ok(SourceKind {
            is_folder: false,
            file_type,
        });
    }

    let mut files: Vec<PathBuf> =
        list_files(path, |_| true).map_err(|e| IngestionError::from_lidar(path, e))?;
    sort_paths(&mut files);
    let file_type = files
        .iter()
        .map(|f| detect_file_type(file_name(f), catalog))
        .find(FileType::is_known)
        .ok_or_else(|| IngestionError::NoRecognizableFiles {
            path: path.to_path_buf(),
            supported: supported_formats(catalog),
        })?;

    debug!(folder = %path.display(), files = files.len(), file_type = ?file_type, "Classified folder");
    Ok(SourceKind {
        is_folder: true,
        file_type,
    })
}

//! Listing the data files of a campaign folder.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LidarError, LidarResult};

/// What to do when one file of a folder fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop and report the failing file.
    #[default]
    Abort,
    /// Log the failure and continue with the remaining files.
    Skip,
}

/// Regular files directly inside `dir` whose name satisfies `accept`.
///
/// Subdirectories are not descended into. The order is unspecified; callers
/// sort before merging.
pub fn list_files<F>(dir: &Path, accept: F) -> LidarResult<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let message = e.to_string();
            // only symlink loops lack an io::Error
            LidarError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, message)),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if accept(name) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

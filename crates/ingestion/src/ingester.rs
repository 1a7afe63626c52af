//! Main Ingester struct for lidar data ingestion.

use std::path::Path;

use lidar_common::{Dataset, FailurePolicy, FormatCatalog};
use lidar_processing::{regrid, ChannelProcessor, ProcessingConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{IngestionError, Result};
use crate::metadata::{classify_source, supported_formats, FileType, SourceKind};

/// Options for ingestion operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Leave out folder files that fail to decode instead of failing.
    pub skip_failed_files: bool,
    /// Resample onto a uniform time grid.
    pub regrid: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            skip_failed_files: false,
            regrid: true,
        }
    }
}

impl IngestOptions {
    fn failure_policy(&self) -> FailurePolicy {
        if self.skip_failed_files {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        }
    }
}

/// Core ingester for lidar data.
///
/// Classifies a source, runs the matching decoder over it and hands back
/// one normalized dataset.
#[derive(Debug, Clone)]
pub struct Ingester {
    catalog: FormatCatalog,
    processor: ChannelProcessor,
}

impl Ingester {
    /// Create a new Ingester.
    pub fn new(catalog: FormatCatalog, config: ProcessingConfig) -> Result<Self> {
        config.validate().map_err(IngestionError::Config)?;
        Ok(Self {
            catalog,
            processor: ChannelProcessor::new(config),
        })
    }

    /// Catalog and processing settings from the environment.
    pub fn from_env() -> Result<Self> {
        let catalog = FormatCatalog::from_env()?;
        let config = ProcessingConfig::from_env();
        Self::new(catalog, config)
    }

    /// Get a reference to the catalog.
    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    pub fn processor(&self) -> &ChannelProcessor {
        &self.processor
    }

    /// Formats this ingester can open, for display.
    pub fn supported_formats(&self) -> Vec<String> {
        supported_formats(&self.catalog)
    }

    /// Classify a source without decoding it.
    pub fn classify(&self, path: impl AsRef<Path>) -> Result<SourceKind> {
        classify_source(path.as_ref(), &self.catalog)
    }

    /// Open a file or folder and return its dataset.
    pub fn open_source(&self, path: impl AsRef<Path>, options: &IngestOptions) -> Result<Dataset> {
        let path = path.as_ref();
        let kind = self.classify(path)?;
        info!(
            path = %path.display(),
            folder = kind.is_folder,
            file_type = ?kind.file_type,
            "Opening lidar source"
        );

        let dataset = if kind.is_folder {
            self.open_folder(path, &kind.file_type, options)?
        } else {
            self.open_file(path, &kind.file_type)?
        };

        let dataset = if options.regrid {
            regrid(dataset)?
        } else {
            dataset
        };

        info!(
            path = %path.display(),
            profiles = dataset.n_profiles(),
            bins = dataset.n_bins(),
            channels = dataset.channels().len(),
            gaps = dataset.nan_row_count(),
            "Opened lidar source"
        );
        Ok(dataset)
    }

    fn open_file(&self, path: &Path, file_type: &FileType) -> Result<Dataset> {
        match file_type {
            FileType::LnaBinary => lna_parser::load_file(path, &self.processor)
                .map_err(|e| IngestionError::from_lna(path, e, self.supported_formats())),
            FileType::NetCdf { format_id } => {
                netcdf_parser::load_file(path, format_id, &self.catalog, &self.processor)
                    .map_err(|e| IngestionError::from_netcdf(path, e, self.supported_formats()))
            }
            FileType::Unknown => Err(IngestionError::UnrecognizedFormat {
                path: path.to_path_buf(),
                supported: self.supported_formats(),
            }),
        }
    }

    fn open_folder(&self, path: &Path, file_type: &FileType, options: &IngestOptions) -> Result<Dataset> {
        let policy = options.failure_policy();
        let merged = match file_type {
            FileType::LnaBinary => lna_parser::decode_folder(path, &self.processor, policy)
                .map_err(|e| IngestionError::from_lna(path, e, self.supported_formats()))?,
            FileType::NetCdf { format_id } => netcdf_parser::decode_folder(
                path,
                format_id,
                &self.catalog,
                &self.processor,
                policy,
            )
            .map_err(|e| IngestionError::from_netcdf(path, e, self.supported_formats()))?,
            FileType::Unknown => None,
        };

        merged.ok_or_else(|| {
            warn!(folder = %path.display(), "No file in folder could be decoded");
            IngestionError::NoRecognizableFiles {
                path: path.to_path_buf(),
                supported: self.supported_formats(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = IngestOptions::default();
        assert!(options.regrid);
        assert!(!options.skip_failed_files);
        assert_eq!(options.failure_policy(), FailurePolicy::Abort);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ProcessingConfig {
            noise_window: 0,
            ..ProcessingConfig::default()
        };
        let err = Ingester::new(FormatCatalog::builtin().unwrap(), config).unwrap_err();
        assert!(matches!(err, IngestionError::Config(_)));
    }
}

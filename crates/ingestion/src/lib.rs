//! Lidar data ingestion library.
//!
//! Turns a file or folder path into one normalized, time-regular
//! [`Dataset`](lidar_common::Dataset).
//!
//! # Architecture
//!
//! ```text
//! path ─ classify ─┬─ lna_0a_raw*.dat ─ lna-parser ────┐
//!                  │                                   ├─ merge ─ regrid ─ Dataset
//!                  └─ {format}_*.nc ── netcdf-parser ──┘
//! ```
//!
//! This crate is what the `ingester` command-line tool and any viewer
//! build on. It handles:
//!
//! - Source classification from file names and the format catalog
//! - Dispatch to the binary or columnar decoder, per file or per folder
//! - Resampling onto a uniform time grid
//! - Error messages that list the supported formats

pub mod error;
mod ingester;
pub mod metadata;
pub mod summary;

// Re-exports
pub use error::{IngestionError, Result};
pub use ingester::{IngestOptions, Ingester};
pub use metadata::{classify_source, detect_file_type, supported_formats, FileType, SourceKind};
pub use summary::DatasetSummary;

//! Decoder for self-describing columnar (netCDF) lidar files.
//!
//! Files are read with the native netcdf library. Which variable holds the
//! time axis, which the range axis and which variables are the channels is
//! decided by the [`FormatCatalog`](lidar_common::FormatCatalog), so new
//! instruments only need a catalog entry.
//!
//! # Time encoding
//!
//! The time variable holds fractional hours of the acquisition day. The day
//! itself comes from the `year`, `month` and `day` global attributes.

pub mod decoder;
pub mod error;
pub mod native;

pub use decoder::{decode_file, decode_folder, files_for_format, load_file, FILE_EXTENSION};
pub use error::{NetCdfError, NetCdfResult};
pub use native::{silence_hdf5_errors, AttrValue};

//! Decoder for LNA vendor binary lidar files.
//!
//! Each file holds one telescope's acquisitions: an ASCII preamble, a binary
//! acquisition header, one noise profile and a series of timed data
//! profiles of raw detector counts.
//!
//! ```text
//! lna_0a_rawNF_*.dat ─┐                        ┌─ merge (file order) ─┐
//!                     ├─ parse ─ correct ─ name┤                      ├─ join on time ─ Dataset
//! lna_0a_rawWF_*.dat ─┘                        └─ merge (file order) ─┘
//! ```
//!
//! Corrections (noise baseline, range-squared, calibration, km conversion,
//! altitude ceiling) come from [`lidar_processing::ChannelProcessor`].

pub mod decoder;
pub mod error;
pub mod naming;
pub mod sections;

pub use decoder::{
    add_ratios, decode_file, decode_folder, fov_of_file_name, is_lna_file_name, load_file,
    read_file, LnaFile, FILE_EXTENSION, FILE_PREFIX,
};
pub use error::{LnaError, LnaResult};
pub use naming::{color_ratio_name, depolarization_name, expand_channel_name, ChannelRole};
pub use sections::{parse_preamble, AcquisitionHeader, ChannelInfo, RawCounts};

//! Channel processing, merging and time regridding for lidar datasets.
//!
//! # Architecture
//!
//! ```text
//! decoded file (RawProfile)
//!      │
//!      ▼
//! ChannelProcessor ── noise baseline, range², calibration, altitude cutoff
//!      │
//!      ├─► ratio()  ── derived channels (depolarization, color)
//!      │
//!      ▼
//! Dataset (one per file)
//!      │
//!      ▼
//! merge() / merge_all() ── files folded in lexical order
//!      │
//!      ▼
//! regrid() ── uniform time grid, NaN rows where data is missing
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod merge;
pub mod ratio;
pub mod regrid;

pub use channel::{altitude_mask, background_deviation, sum_channels, tail_mean, ChannelProcessor};
pub use config::{ProcessingConfig, RatioBounds};
pub use error::{ProcessingError, Result};
pub use merge::{join_on_time, merge, merge_all, merge_files, sort_paths};
pub use ratio::{ratio, ratio_value, ratio_with_defaults};
pub use regrid::{nominal_step, regrid, regrid_plan, RegridPlan};

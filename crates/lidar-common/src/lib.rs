//! Common types and utilities shared across the lidar ingestion crates.
//!
//! Everything a decoder produces and every later pipeline stage consumes
//! lives here: the per-file [`RawProfile`], the mergeable [`Dataset`], the
//! row-major [`ChannelArray`] and the declarative [`FormatCatalog`].

pub mod catalog;
pub mod error;
pub mod folder;
pub mod model;
pub mod time;

pub use catalog::{ChannelDefinition, FormatCatalog, PropertyValue, RatioDefinition, CATALOG_ENV_VAR};
pub use error::{LidarError, LidarResult};
pub use folder::{list_files, FailurePolicy};
pub use model::{ChannelArray, ChannelKind, Dataset, DatasetParts, FormatTag, Fov, RawProfile};
pub use time::{fallback_date, hours_of_day_to_timestamp, timestamp_from_fields};

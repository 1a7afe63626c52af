//! In-memory representation of decoded lidar data.
//!
//! A decoder produces one [`RawProfile`] per file. Processing turns it into a
//! [`Dataset`], which is the unit the merger and the regridder operate on.
//! Both keep every channel as a [`ChannelArray`] with one row per profile
//! (time) and one column per altitude bin.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LidarError, LidarResult};

/// Row-major 2D sample buffer: `n_profiles` rows by `n_bins` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelArray {
    n_profiles: usize,
    n_bins: usize,
    values: Vec<f32>,
}

impl ChannelArray {
    /// Wrap an existing buffer. Fails if its length is not `n_profiles * n_bins`.
    pub fn new(n_profiles: usize, n_bins: usize, values: Vec<f32>) -> LidarResult<Self> {
        let expected = n_profiles * n_bins;
        if values.len() != expected {
            return Err(LidarError::LengthMismatch {
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            n_profiles,
            n_bins,
            values,
        })
    }

    /// Array of the given shape with every element set to `value`.
    pub fn filled(n_profiles: usize, n_bins: usize, value: f32) -> Self {
        Self {
            n_profiles,
            n_bins,
            values: vec![value; n_profiles * n_bins],
        }
    }

    /// Array with no rows yet, ready for [`push_row`](Self::push_row).
    pub fn with_bins(n_bins: usize) -> Self {
        Self {
            n_profiles: 0,
            n_bins,
            values: Vec::new(),
        }
    }

    pub fn n_profiles(&self) -> usize {
        self.n_profiles
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_profiles, self.n_bins)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.n_profiles {
            return None;
        }
        let start = index * self.n_bins;
        Some(&self.values[start..start + self.n_bins])
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        if index >= self.n_profiles {
            return None;
        }
        let start = index * self.n_bins;
        Some(&mut self.values[start..start + self.n_bins])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on 0
        self.values.chunks_exact(self.n_bins.max(1)).take(self.n_profiles)
    }

    pub fn get(&self, profile: usize, bin: usize) -> Option<f32> {
        if bin >= self.n_bins {
            return None;
        }
        self.row(profile).map(|r| r[bin])
    }

    /// Append one profile. The row must have exactly `n_bins` samples.
    pub fn push_row(&mut self, row: &[f32]) -> LidarResult<()> {
        if row.len() != self.n_bins {
            return Err(LidarError::LengthMismatch {
                expected: self.n_bins,
                found: row.len(),
            });
        }
        self.values.extend_from_slice(row);
        self.n_profiles += 1;
        Ok(())
    }

    /// Append `count` rows of NaN.
    pub fn push_nan_rows(&mut self, count: usize) {
        self.values
            .extend(std::iter::repeat(f32::NAN).take(count * self.n_bins));
        self.n_profiles += count;
    }

    /// Append all rows of `other` below the rows of `self`.
    pub fn append(&mut self, other: ChannelArray) -> LidarResult<()> {
        if other.n_bins != self.n_bins && other.n_profiles > 0 {
            return Err(LidarError::LengthMismatch {
                expected: self.n_bins,
                found: other.n_bins,
            });
        }
        self.values.extend(other.values);
        self.n_profiles += other.n_profiles;
        Ok(())
    }

    /// Keep only the columns where `mask` is true.
    pub fn select_columns(&self, mask: &[bool]) -> ChannelArray {
        let kept = mask
            .iter()
            .take(self.n_bins)
            .filter(|&&keep| keep)
            .count();
        let mut values = Vec::with_capacity(self.n_profiles * kept);
        for row in self.rows() {
            values.extend(
                row.iter()
                    .zip(mask.iter())
                    .filter(|(_, &keep)| keep)
                    .map(|(v, _)| *v),
            );
        }
        ChannelArray {
            n_profiles: self.n_profiles,
            n_bins: kept,
            values,
        }
    }

    /// True if every sample of the given row is NaN.
    pub fn is_nan_row(&self, index: usize) -> bool {
        self.row(index)
            .map(|r| r.iter().all(|v| v.is_nan()))
            .unwrap_or(false)
    }
}

/// Telescope field of view of the binary instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Fov {
    /// Narrow field of view (NFOV, files tagged `NF`).
    Narrow,
    /// Wide field of view (WFOV, files tagged `WF`).
    Wide,
}

impl Fov {
    /// Selector value stored in the binary header; 1 means wide.
    pub fn from_system(system: i32) -> Self {
        if system == 1 {
            Fov::Wide
        } else {
            Fov::Narrow
        }
    }

    /// Label used in channel names.
    pub fn label(&self) -> &'static str {
        match self {
            Fov::Narrow => "NFOV",
            Fov::Wide => "WFOV",
        }
    }

    /// Tag used in binary file names (`lna_0a_rawNF_...`).
    pub fn file_tag(&self) -> &'static str {
        match self {
            Fov::Narrow => "NF",
            Fov::Wide => "WF",
        }
    }

    /// First positional channel index for this telescope.
    pub fn start_index(&self) -> u32 {
        match self {
            Fov::Narrow => 1,
            Fov::Wide => 4,
        }
    }

    pub fn all() -> [Fov; 2] {
        [Fov::Narrow, Fov::Wide]
    }
}

impl fmt::Display for Fov {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormatTag {
    /// LNA vendor binary files.
    Binary,
    /// Self-describing columnar files, with the catalog format identifier.
    Columnar { format_id: String },
}

impl FormatTag {
    pub fn is_binary(&self) -> bool {
        matches!(self, FormatTag::Binary)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FormatTag::Binary => "binary",
            FormatTag::Columnar { .. } => "columnar",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Binary => write!(f, "binary"),
            FormatTag::Columnar { format_id } => write!(f, "columnar ({})", format_id),
        }
    }
}

/// Measured signal or derived ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    Signal,
    Ratio,
}

impl ChannelKind {
    /// Ratio channels carry `Ratio` in their display name.
    pub fn of(name: &str) -> Self {
        if name.contains("Ratio") {
            ChannelKind::Ratio
        } else {
            ChannelKind::Signal
        }
    }
}

/// Output of decoding a single file, before derived channels are added.
#[derive(Debug, Clone)]
pub struct RawProfile {
    pub timestamps: Vec<DateTime<Utc>>,
    /// Altitude of each bin, in km once normalized.
    pub altitude: Vec<f32>,
    pub channels: BTreeMap<String, ChannelArray>,
    pub date: NaiveDate,
    pub format: FormatTag,
    pub fov: Option<Fov>,
}

impl RawProfile {
    pub fn n_profiles(&self) -> usize {
        self.timestamps.len()
    }

    /// Add a channel, refusing duplicates and mis-shaped arrays.
    pub fn insert_channel(&mut self, name: impl Into<String>, data: ChannelArray) -> LidarResult<()> {
        let name = name.into();
        check_shape(&name, &data, self.timestamps.len(), self.altitude.len())?;
        if self.channels.contains_key(&name) {
            return Err(LidarError::DuplicateChannel(name));
        }
        self.channels.insert(name, data);
        Ok(())
    }

    /// Check every channel against the timestamp and altitude lengths.
    pub fn validate(&self) -> LidarResult<()> {
        for (name, data) in &self.channels {
            check_shape(name, data, self.timestamps.len(), self.altitude.len())?;
        }
        Ok(())
    }
}

fn check_shape(name: &str, data: &ChannelArray, rows: usize, cols: usize) -> LidarResult<()> {
    if data.shape() != (rows, cols) {
        return Err(LidarError::ShapeMismatch {
            channel: name.to_string(),
            expected: (rows, cols),
            found: data.shape(),
        });
    }
    Ok(())
}

/// Unchecked field bundle used to take a [`Dataset`] apart and rebuild it.
#[derive(Debug, Clone)]
pub struct DatasetParts {
    pub timestamps: Vec<DateTime<Utc>>,
    pub altitude: Vec<f32>,
    pub channels: BTreeMap<String, ChannelArray>,
    pub date: NaiveDate,
    pub format: FormatTag,
    pub has_ratio: bool,
}

/// The normalized, mergeable unit handed to callers.
///
/// Channel shapes always agree with the timestamp and altitude lengths and
/// channel names are unique. Every constructor enforces this.
#[derive(Debug, Clone)]
pub struct Dataset {
    timestamps: Vec<DateTime<Utc>>,
    altitude: Vec<f32>,
    channels: BTreeMap<String, ChannelArray>,
    date: NaiveDate,
    format: FormatTag,
    has_ratio: bool,
}

impl Dataset {
    /// Promote a decoded file. Fails if the profile is inconsistent.
    pub fn from_profile(profile: RawProfile) -> LidarResult<Self> {
        Self::from_parts(DatasetParts {
            timestamps: profile.timestamps,
            altitude: profile.altitude,
            channels: profile.channels,
            date: profile.date,
            format: profile.format,
            has_ratio: false,
        })
    }

    pub fn from_parts(parts: DatasetParts) -> LidarResult<Self> {
        for (name, data) in &parts.channels {
            check_shape(name, data, parts.timestamps.len(), parts.altitude.len())?;
        }
        Ok(Self {
            timestamps: parts.timestamps,
            altitude: parts.altitude,
            channels: parts.channels,
            date: parts.date,
            format: parts.format,
            has_ratio: parts.has_ratio,
        })
    }

    pub fn into_parts(self) -> DatasetParts {
        DatasetParts {
            timestamps: self.timestamps,
            altitude: self.altitude,
            channels: self.channels,
            date: self.date,
            format: self.format,
            has_ratio: self.has_ratio,
        }
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn altitude(&self) -> &[f32] {
        &self.altitude
    }

    pub fn channels(&self) -> &BTreeMap<String, ChannelArray> {
        &self.channels
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelArray> {
        self.channels.get(name)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn format(&self) -> &FormatTag {
        &self.format
    }

    pub fn has_ratio(&self) -> bool {
        self.has_ratio
    }

    pub fn n_profiles(&self) -> usize {
        self.timestamps.len()
    }

    pub fn n_bins(&self) -> usize {
        self.altitude.len()
    }

    /// Add a measured channel.
    pub fn insert_channel(&mut self, name: impl Into<String>, data: ChannelArray) -> LidarResult<()> {
        let name = name.into();
        check_shape(&name, &data, self.timestamps.len(), self.altitude.len())?;
        if self.channels.contains_key(&name) {
            return Err(LidarError::DuplicateChannel(name));
        }
        self.channels.insert(name, data);
        Ok(())
    }

    /// Add a derived ratio channel and mark the dataset as carrying ratios.
    pub fn insert_ratio(&mut self, name: impl Into<String>, data: ChannelArray) -> LidarResult<()> {
        self.insert_channel(name, data)?;
        self.has_ratio = true;
        Ok(())
    }

    /// Sorted channel names of one kind.
    pub fn channel_names(&self, kind: ChannelKind) -> Vec<&str> {
        // BTreeMap keys are already sorted
        self.channels
            .keys()
            .filter(|name| ChannelKind::of(name) == kind)
            .map(String::as_str)
            .collect()
    }

    /// One vertical profile of a channel.
    pub fn profile(&self, channel: &str, index: usize) -> Option<&[f32]> {
        self.channels.get(channel).and_then(|c| c.row(index))
    }

    /// Only binary-origin data still carries the range-squared factor that
    /// the viewer can toggle off.
    pub fn supports_range_correction(&self) -> bool {
        self.format.is_binary()
    }

    /// Number of profiles whose samples are NaN in every channel.
    pub fn nan_row_count(&self) -> usize {
        if self.channels.is_empty() {
            return 0;
        }
        (0..self.n_profiles())
            .filter(|&i| self.channels.values().all(|c| c.is_nan_row(i)))
            .count()
    }

    /// Re-check the shape invariant.
    pub fn validate(&self) -> LidarResult<()> {
        for (name, data) in &self.channels {
            check_shape(name, data, self.timestamps.len(), self.altitude.len())?;
        }
        if let Some(pos) = self.timestamps.windows(2).position(|w| w[1] < w[0]) {
            tracing::debug!(index = pos + 1, "Timestamps are not monotonic");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn times(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|i| Utc.with_ymd_and_hms(2024, 3, 1, 0, i as u32, 0).unwrap())
            .collect()
    }

    fn dataset(n: usize, bins: usize) -> Dataset {
        Dataset::from_parts(DatasetParts {
            timestamps: times(n),
            altitude: (0..bins).map(|i| i as f32 * 0.1).collect(),
            channels: BTreeMap::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            format: FormatTag::Binary,
            has_ratio: false,
        })
        .unwrap()
    }

    #[test]
    fn test_channel_array_rows() {
        let arr = ChannelArray::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(arr.row(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(arr.get(0, 2), Some(3.0));
        assert!(arr.row(2).is_none());
        assert_eq!(arr.rows().count(), 2);
    }

    #[test]
    fn test_channel_array_length_checked() {
        let err = ChannelArray::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, LidarError::LengthMismatch { expected: 6, found: 5 }));
    }

    #[test]
    fn test_select_columns() {
        let arr = ChannelArray::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let cut = arr.select_columns(&[true, true, false]);
        assert_eq!(cut.shape(), (2, 2));
        assert_eq!(cut.values(), &[1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn test_push_nan_rows() {
        let mut arr = ChannelArray::with_bins(2);
        arr.push_row(&[1.0, 2.0]).unwrap();
        arr.push_nan_rows(2);
        assert_eq!(arr.shape(), (3, 2));
        assert!(arr.is_nan_row(2));
        assert!(!arr.is_nan_row(0));
    }

    #[test]
    fn test_insert_channel_rejects_duplicates() {
        let mut ds = dataset(2, 3);
        ds.insert_channel("p01 - Pr2 532nm NFOV", ChannelArray::filled(2, 3, 1.0))
            .unwrap();
        let err = ds
            .insert_channel("p01 - Pr2 532nm NFOV", ChannelArray::filled(2, 3, 2.0))
            .unwrap_err();
        assert!(matches!(err, LidarError::DuplicateChannel(_)));
        // original data untouched
        assert_eq!(ds.channel("p01 - Pr2 532nm NFOV").unwrap().get(0, 0), Some(1.0));
    }

    #[test]
    fn test_insert_channel_rejects_bad_shape() {
        let mut ds = dataset(2, 3);
        let err = ds
            .insert_channel("x", ChannelArray::filled(3, 3, 0.0))
            .unwrap_err();
        assert!(matches!(err, LidarError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_channel_kinds() {
        let mut ds = dataset(1, 1);
        ds.insert_channel("p01 - Pr2 532nm NFOV", ChannelArray::filled(1, 1, 1.0))
            .unwrap();
        ds.insert_ratio(
            "p07 - Depolarization Ratio 532nm NFOV",
            ChannelArray::filled(1, 1, 0.5),
        )
        .unwrap();
        assert!(ds.has_ratio());
        assert_eq!(ds.channel_names(ChannelKind::Signal), vec!["p01 - Pr2 532nm NFOV"]);
        assert_eq!(
            ds.channel_names(ChannelKind::Ratio),
            vec!["p07 - Depolarization Ratio 532nm NFOV"]
        );
    }

    #[test]
    fn test_nan_row_count() {
        let mut ds = dataset(3, 2);
        let mut a = ChannelArray::with_bins(2);
        a.push_row(&[1.0, 1.0]).unwrap();
        a.push_nan_rows(1);
        a.push_row(&[f32::NAN, 2.0]).unwrap();
        ds.insert_channel("a", a).unwrap();
        assert_eq!(ds.nan_row_count(), 1);
    }

    #[test]
    fn test_fov_labels() {
        assert_eq!(Fov::from_system(1), Fov::Wide);
        assert_eq!(Fov::from_system(0), Fov::Narrow);
        assert_eq!(Fov::Wide.start_index(), 4);
        assert_eq!(Fov::Narrow.file_tag(), "NF");
    }
}

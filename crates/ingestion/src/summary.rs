//! Serializable overview of an opened dataset.

use chrono::{DateTime, NaiveDate, Utc};
use lidar_common::{ChannelKind, Dataset};
use serde::Serialize;

/// What a caller needs to know about a dataset without its samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub format: String,
    pub date: NaiveDate,
    pub profiles: usize,
    pub bins: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Altitude span in km.
    pub altitude_range: Option<(f32, f32)>,
    pub channels: Vec<String>,
    pub ratios: Vec<String>,
    pub has_ratio: bool,
    /// Profiles that are NaN in every channel, i.e. acquisition gaps.
    pub gap_profiles: usize,
    pub supports_range_correction: bool,
}

impl DatasetSummary {
    pub fn of(dataset: &Dataset) -> Self {
        let owned = |names: Vec<&str>| names.into_iter().map(str::to_string).collect();
        let altitude = dataset.altitude();

        Self {
            format: dataset.format().to_string(),
            date: dataset.date(),
            profiles: dataset.n_profiles(),
            bins: dataset.n_bins(),
            start: dataset.timestamps().first().copied(),
            end: dataset.timestamps().last().copied(),
            altitude_range: altitude.first().zip(altitude.last()).map(|(a, b)| (*a, *b)),
            channels: owned(dataset.channel_names(ChannelKind::Signal)),
            ratios: owned(dataset.channel_names(ChannelKind::Ratio)),
            has_ratio: dataset.has_ratio(),
            gap_profiles: dataset.nan_row_count(),
            supports_range_correction: dataset.supports_range_correction(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lidar_common::ChannelArray;
    use test_utils::{dataset_with_channels, minute_timestamps};

    #[test]
    fn test_summary_fields() {
        let mut ds = dataset_with_channels(&minute_timestamps(0, 4), 3, &[("p01 - Pr2 532nm NFOV", 1.0)]);
        ds.insert_ratio("p09 - Color Ratio 1064nm/532nm NFOV", ChannelArray::filled(4, 3, f32::NAN))
            .unwrap();

        let summary = DatasetSummary::of(&ds);
        assert_eq!(summary.profiles, 4);
        assert_eq!(summary.bins, 3);
        assert_eq!(summary.channels, vec!["p01 - Pr2 532nm NFOV"]);
        assert_eq!(summary.ratios, vec!["p09 - Color Ratio 1064nm/532nm NFOV"]);
        assert!(summary.has_ratio);
        assert_eq!(summary.gap_profiles, 0);
        assert_eq!(summary.format, "binary");
        assert_eq!(summary.altitude_range, Some((0.0, 0.03)));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["profiles"], 4);
    }
}

//! Generators for synthetic timestamps and datasets.
//!
//! Timestamps are anchored at 08:00 UTC on the campaign day so that test
//! expectations can be written in whole minutes.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use lidar_common::{ChannelArray, Dataset, DatasetParts, FormatTag};

use crate::fixtures::{CAMPAIGN_DATE, CAMPAIGN_START_HOUR};

/// First timestamp of every generated series.
pub fn campaign_start() -> DateTime<Utc> {
    let (y, m, d) = CAMPAIGN_DATE;
    Utc.with_ymd_and_hms(y, m, d, CAMPAIGN_START_HOUR, 0, 0)
        .single()
        .expect("valid campaign start")
}

/// `count` timestamps one minute apart, starting `start_minute` minutes
/// after [`campaign_start`].
///
/// ```
/// use test_utils::minute_timestamps;
///
/// let ts = minute_timestamps(10, 3);
/// assert_eq!(ts.len(), 3);
/// assert_eq!((ts[2] - ts[0]).num_minutes(), 2);
/// ```
pub fn minute_timestamps(start_minute: i64, count: usize) -> Vec<DateTime<Utc>> {
    (0..count as i64)
        .map(|i| campaign_start() + Duration::minutes(start_minute + i))
        .collect()
}

/// Timestamps at arbitrary minute offsets from [`campaign_start`].
pub fn timestamps_at_minutes(minutes: &[i64]) -> Vec<DateTime<Utc>> {
    minutes
        .iter()
        .map(|&m| campaign_start() + Duration::minutes(m))
        .collect()
}

/// Altitude grid of `n_bins` bins spaced 15 m apart, in km.
pub fn altitude_grid(n_bins: usize) -> Vec<f32> {
    (0..n_bins).map(|i| i as f32 * 0.015).collect()
}

/// A binary-tagged dataset where every named channel holds one constant.
pub fn dataset_with_channels(
    timestamps: &[DateTime<Utc>],
    n_bins: usize,
    channels: &[(&str, f32)],
) -> Dataset {
    let n = timestamps.len();
    let channels: BTreeMap<String, ChannelArray> = channels
        .iter()
        .map(|(name, value)| (name.to_string(), ChannelArray::filled(n, n_bins, *value)))
        .collect();
    let date = timestamps
        .first()
        .map(|t| t.date_naive())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(2004, 3, 19).expect("valid date"));

    Dataset::from_parts(DatasetParts {
        timestamps: timestamps.to_vec(),
        altitude: altitude_grid(n_bins),
        channels,
        date,
        format: FormatTag::Binary,
        has_ratio: false,
    })
    .expect("generated dataset is consistent")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_timestamps() {
        let ts = minute_timestamps(0, 60);
        assert_eq!(ts.len(), 60);
        assert_eq!(ts[0], campaign_start());
        assert!(ts.windows(2).all(|w| (w[1] - w[0]).num_seconds() == 60));
    }

    #[test]
    fn test_dataset_with_channels() {
        let ds = dataset_with_channels(&minute_timestamps(0, 4), 5, &[("a", 1.5), ("b", 2.0)]);
        assert_eq!(ds.n_profiles(), 4);
        assert_eq!(ds.n_bins(), 5);
        assert_eq!(ds.channel("a").unwrap().get(3, 4), Some(1.5));
    }
}

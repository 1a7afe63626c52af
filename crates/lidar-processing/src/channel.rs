//! Per-channel corrections and derived channels.
//!
//! Binary profiles arrive as raw detector counts. [`ChannelProcessor`] turns
//! them into range-corrected, calibrated signal on a km altitude grid and
//! adds the ratio channels built from them. The columnar decoder only uses
//! the ratio part, since its files are already corrected.

use std::collections::BTreeMap;

use lidar_common::{ChannelArray, Dataset};
use tracing::{debug, warn};

use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, Result};
use crate::ratio::ratio;

/// Mean of the last `window` samples (all of them when shorter).
pub fn tail_mean(samples: &[f32], window: usize) -> f64 {
    let start = samples.len().saturating_sub(window);
    let tail = &samples[start..];
    if tail.is_empty() {
        return f64::NAN;
    }
    tail.iter().map(|&v| v as f64).sum::<f64>() / tail.len() as f64
}

/// Signal relative to the far-range background: `-(x - mean(tail))`.
///
/// Detector counts are inverted, so the sign flip makes backscatter positive.
/// Applied to the noise profile and to every data profile alike.
pub fn background_deviation(samples: &[f32], window: usize) -> Vec<f32> {
    let mean = tail_mean(samples, window);
    samples
        .iter()
        .map(|&v| (-(v as f64 - mean)) as f32)
        .collect()
}

/// Bins strictly below `max_km`.
pub fn altitude_mask(altitude_km: &[f32], max_km: f32) -> Vec<bool> {
    altitude_km.iter().map(|&a| a < max_km).collect()
}

/// Elementwise sum of two channels of equal shape.
pub fn sum_channels(a: &ChannelArray, b: &ChannelArray) -> Result<ChannelArray> {
    if a.shape() != b.shape() {
        return Err(ProcessingError::shape_mismatch(format!(
            "cannot add channels of shapes {:?} and {:?}",
            a.shape(),
            b.shape()
        )));
    }
    let values = a.values().iter().zip(b.values()).map(|(x, y)| x + y).collect();
    let (rows, cols) = a.shape();
    Ok(ChannelArray::new(rows, cols, values)?)
}

/// Applies the configured corrections.
#[derive(Debug, Clone, Default)]
pub struct ChannelProcessor {
    config: ProcessingConfig,
}

impl ChannelProcessor {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Background-relative signal of one raw profile.
    pub fn deviation(&self, raw: &[f32]) -> Vec<f32> {
        background_deviation(raw, self.config.noise_window)
    }

    /// Noise subtraction, range-squared correction and calibration of one
    /// profile.
    ///
    /// `altitude_m` is the range of each bin in metres. All three slices must
    /// have the same length.
    pub fn correct_profile(&self, profile: &[f32], noise: &[f32], altitude_m: &[f32]) -> Result<Vec<f32>> {
        if profile.len() != noise.len() || profile.len() != altitude_m.len() {
            return Err(ProcessingError::shape_mismatch(format!(
                "profile has {} samples, noise baseline {}, altitude grid {}",
                profile.len(),
                noise.len(),
                altitude_m.len()
            )));
        }

        let calibration = self.config.calibration;
        Ok(profile
            .iter()
            .zip(noise)
            .zip(altitude_m)
            .map(|((&p, &b), &r)| {
                let r = r as f64;
                (((p - b) as f64) * r * r) as f32 * calibration
            })
            .collect())
    }

    /// Convert an altitude grid from metres to kilometres.
    pub fn to_kilometres(altitude_m: &[f32]) -> Vec<f32> {
        altitude_m.iter().map(|&a| a / 1000.0).collect()
    }

    /// Drop every bin at or above the altitude ceiling, from the grid and
    /// from all channels.
    ///
    /// A channel may be shorter than the grid as long as it still covers
    /// every retained bin; otherwise the cut fails with a shape mismatch.
    pub fn cut_off_altitude(
        &self,
        altitude_km: Vec<f32>,
        channels: BTreeMap<String, ChannelArray>,
    ) -> Result<(Vec<f32>, BTreeMap<String, ChannelArray>)> {
        let mask = altitude_mask(&altitude_km, self.config.max_altitude_km);
        let altitude: Vec<f32> = altitude_km
            .into_iter()
            .zip(&mask)
            .filter(|(_, &keep)| keep)
            .map(|(a, _)| a)
            .collect();
        debug!(
            bins = altitude.len(),
            max_km = self.config.max_altitude_km,
            "Applied altitude cutoff"
        );

        let mut cut = BTreeMap::new();
        for (name, data) in channels {
            let data = data.select_columns(&mask);
            if data.n_bins() != altitude.len() {
                return Err(ProcessingError::shape_mismatch(format!(
                    "channel '{}' covers {} of {} bins below {} km",
                    name,
                    data.n_bins(),
                    altitude.len(),
                    self.config.max_altitude_km
                )));
            }
            cut.insert(name, data);
        }
        Ok((altitude, cut))
    }

    /// Compute `numerator / denominator` and insert it as a ratio channel.
    ///
    /// Returns `false` without touching the dataset when an input channel is
    /// absent.
    pub fn add_ratio(
        &self,
        dataset: &mut Dataset,
        name: &str,
        numerator: &str,
        denominator: &str,
    ) -> Result<bool> {
        let (Some(num), Some(den)) = (dataset.channel(numerator), dataset.channel(denominator)) else {
            warn!(
                ratio = %name,
                numerator = %numerator,
                denominator = %denominator,
                "Skipping ratio, input channel missing"
            );
            return Ok(false);
        };

        let data = ratio(den, num, &self.config.ratio)?;
        dataset.insert_ratio(name, data)?;
        Ok(true)
    }

    /// Like [`add_ratio`](Self::add_ratio), with the denominator being the
    /// sum of two channels.
    pub fn add_ratio_over_sum(
        &self,
        dataset: &mut Dataset,
        name: &str,
        numerator: &str,
        denominators: (&str, &str),
    ) -> Result<bool> {
        let (Some(num), Some(a), Some(b)) = (
            dataset.channel(numerator),
            dataset.channel(denominators.0),
            dataset.channel(denominators.1),
        ) else {
            warn!(ratio = %name, "Skipping ratio, input channel missing");
            return Ok(false);
        };

        let den = sum_channels(a, b)?;
        let data = ratio(&den, num, &self.config.ratio)?;
        dataset.insert_ratio(name, data)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use lidar_common::{DatasetParts, FormatTag};

    #[test]
    fn test_tail_mean_short_profile() {
        assert_eq!(tail_mean(&[1.0, 2.0, 3.0], 200), 2.0);
        assert_eq!(tail_mean(&[100.0, 2.0, 4.0], 2), 3.0);
        assert!(tail_mean(&[], 200).is_nan());
    }

    #[test]
    fn test_background_deviation_sign() {
        let out = background_deviation(&[-10.0, 0.0, 0.0, 0.0], 3);
        assert_eq!(out, vec![10.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_correct_profile() {
        let processor = ChannelProcessor::default();
        let out = processor
            .correct_profile(&[3.0, 3.0], &[1.0, 1.0], &[0.0, 1000.0])
            .unwrap();
        assert_eq!(out[0], 0.0);
        // (3 - 1) * 1000^2 * 1e-12
        assert!((out[1] - 2e-6).abs() < 1e-12);
    }

    #[test]
    fn test_correct_profile_length_mismatch() {
        let processor = ChannelProcessor::default();
        assert!(processor.correct_profile(&[1.0], &[1.0, 2.0], &[0.0]).is_err());
    }

    #[test]
    fn test_cut_off_altitude() {
        let processor = ChannelProcessor::default();
        let altitude = vec![0.0, 7.5, 14.99, 15.0, 22.5];
        let mut channels = BTreeMap::new();
        channels.insert(
            "a".to_string(),
            ChannelArray::new(1, 5, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(),
        );
        let (alt, channels) = processor.cut_off_altitude(altitude, channels).unwrap();
        assert_eq!(alt, vec![0.0, 7.5, 14.99]);
        assert_eq!(channels["a"].values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cut_off_altitude_short_channels() {
        let processor = ChannelProcessor::default();
        let altitude = vec![0.0, 5.0, 10.0, 20.0];
        let mut channels = BTreeMap::new();
        // covers every bin below the ceiling
        channels.insert("ok".to_string(), ChannelArray::filled(2, 3, 1.0));
        let (alt, channels) = processor
            .cut_off_altitude(altitude.clone(), channels)
            .unwrap();
        assert_eq!(alt.len(), 3);
        assert_eq!(channels["ok"].shape(), (2, 3));

        let mut short = BTreeMap::new();
        short.insert("short".to_string(), ChannelArray::filled(2, 2, 1.0));
        let err = processor.cut_off_altitude(altitude, short).unwrap_err();
        assert!(matches!(err, ProcessingError::ShapeMismatch(_)));
    }

    #[test]
    fn test_add_ratio_missing_input() {
        let processor = ChannelProcessor::default();
        let mut ds = Dataset::from_parts(DatasetParts {
            timestamps: vec![Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()],
            altitude: vec![0.1, 0.2],
            channels: BTreeMap::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            format: FormatTag::Binary,
            has_ratio: false,
        })
        .unwrap();
        ds.insert_channel("par", ChannelArray::filled(1, 2, 4.0)).unwrap();

        assert!(!processor.add_ratio(&mut ds, "r", "perp", "par").unwrap());
        assert!(!ds.has_ratio());

        ds.insert_channel("perp", ChannelArray::filled(1, 2, 1.0)).unwrap();
        assert!(processor.add_ratio(&mut ds, "r", "perp", "par").unwrap());
        assert!(ds.has_ratio());
        assert_eq!(ds.channel("r").unwrap().values(), &[0.25, 0.25]);

        assert!(processor
            .add_ratio_over_sum(&mut ds, "c", "perp", ("par", "perp"))
            .unwrap());
        assert_eq!(ds.channel("c").unwrap().values(), &[0.2, 0.2]);
    }
}

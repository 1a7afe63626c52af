//! Configuration for channel processing.

use serde::{Deserialize, Serialize};

/// Thresholds applied by the ratio operator.
///
/// Every derived channel uses the same bounds so that ratios from different
/// decoders stay comparable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBounds {
    /// Smallest accepted quotient.
    pub min: f32,
    /// Largest accepted quotient.
    pub max: f32,
    /// Inputs below this value are treated as missing.
    pub invalid_sentinel: f32,
}

impl Default for RatioBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 10.0,
            invalid_sentinel: -998.0,
        }
    }
}

/// Configuration for the binary post-decode corrections and derived channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Bins at or above this altitude (km) are discarded.
    pub max_altitude_km: f32,

    /// Scale factor applied after range correction.
    pub calibration: f32,

    /// Number of trailing samples averaged to estimate the background level.
    pub noise_window: usize,

    /// Ratio operator thresholds.
    pub ratio: RatioBounds,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_altitude_km: 15.0,
            calibration: 1e-12,
            noise_window: 200,
            ratio: RatioBounds::default(),
        }
    }
}

impl ProcessingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("LIDAR_MAX_ALTITUDE_KM") {
            if let Ok(km) = val.parse() {
                config.max_altitude_km = km;
            }
        }

        if let Ok(val) = std::env::var("LIDAR_CALIBRATION") {
            if let Ok(factor) = val.parse() {
                config.calibration = factor;
            }
        }

        if let Ok(val) = std::env::var("LIDAR_NOISE_WINDOW") {
            if let Ok(window) = val.parse() {
                config.noise_window = window;
            }
        }

        if let Ok(val) = std::env::var("LIDAR_RATIO_MIN") {
            if let Ok(min) = val.parse() {
                config.ratio.min = min;
            }
        }

        if let Ok(val) = std::env::var("LIDAR_RATIO_MAX") {
            if let Ok(max) = val.parse() {
                config.ratio.max = max;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_altitude_km > 0.0) {
            return Err("max_altitude_km must be > 0".to_string());
        }

        if !(self.calibration > 0.0) {
            return Err("calibration must be > 0".to_string());
        }

        if self.noise_window == 0 {
            return Err("noise_window must be > 0".to_string());
        }

        if !(self.ratio.min <= self.ratio.max) {
            return Err("ratio.min must not exceed ratio.max".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessingConfig::default();
        assert_eq!(config.max_altitude_km, 15.0);
        assert_eq!(config.calibration, 1e-12);
        assert_eq!(config.noise_window, 200);
        assert_eq!(config.ratio, RatioBounds { min: 0.0, max: 10.0, invalid_sentinel: -998.0 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ProcessingConfig::default();
        config.noise_window = 0;
        assert!(config.validate().is_err());

        let mut config = ProcessingConfig::default();
        config.ratio.min = 20.0;
        assert!(config.validate().is_err());

        let mut config = ProcessingConfig::default();
        config.max_altitude_km = f32::NAN;
        assert!(config.validate().is_err());
    }
}

//! Elementwise ratio of two channels with sentinel and bounds filtering.

use lidar_common::ChannelArray;

use crate::config::RatioBounds;
use crate::error::{ProcessingError, Result};

/// Quotient of one sample pair, or NaN when it is not a valid ratio.
///
/// NaN is returned when either input is below the sentinel, when the quotient
/// falls outside `[min, max]`, or when it is not a number at all (0/0, any NaN
/// input). Division by zero gives an infinite quotient, which the bounds
/// reject.
#[inline]
pub fn ratio_value(denominator: f32, numerator: f32, bounds: &RatioBounds) -> f32 {
    if denominator < bounds.invalid_sentinel || numerator < bounds.invalid_sentinel {
        return f32::NAN;
    }
    let quotient = numerator / denominator;
    if quotient >= bounds.min && quotient <= bounds.max {
        quotient
    } else {
        f32::NAN
    }
}

/// `numerator / denominator` over whole channels.
pub fn ratio(
    denominator: &ChannelArray,
    numerator: &ChannelArray,
    bounds: &RatioBounds,
) -> Result<ChannelArray> {
    if denominator.shape() != numerator.shape() {
        return Err(ProcessingError::shape_mismatch(format!(
            "ratio operands have shapes {:?} and {:?}",
            denominator.shape(),
            numerator.shape()
        )));
    }

    let values = denominator
        .values()
        .iter()
        .zip(numerator.values())
        .map(|(&d, &n)| ratio_value(d, n, bounds))
        .collect();

    let (rows, cols) = denominator.shape();
    Ok(ChannelArray::new(rows, cols, values)?)
}

/// [`ratio`] with the standard bounds (0, 10, -998).
pub fn ratio_with_defaults(denominator: &ChannelArray, numerator: &ChannelArray) -> Result<ChannelArray> {
    ratio(denominator, numerator, &RatioBounds::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(values: &[f32]) -> ChannelArray {
        ChannelArray::new(1, values.len(), values.to_vec()).unwrap()
    }

    #[test]
    fn test_ratio_basic() {
        let out = ratio_with_defaults(&arr(&[2.0, 4.0]), &arr(&[1.0, 2.0])).unwrap();
        assert_eq!(out.values(), &[0.5, 0.5]);
    }

    #[test]
    fn test_ratio_bounds_are_inclusive() {
        let out = ratio_with_defaults(&arr(&[1.0, 1.0, 1.0, 1.0]), &arr(&[0.0, 10.0, 10.5, -0.5]))
            .unwrap();
        assert_eq!(out.values()[0], 0.0);
        assert_eq!(out.values()[1], 10.0);
        assert!(out.values()[2].is_nan());
        assert!(out.values()[3].is_nan());
    }

    #[test]
    fn test_ratio_sentinel() {
        // -999 / -999 = 1, inside bounds, but both inputs are flagged missing
        let out = ratio_with_defaults(&arr(&[-999.0, 1.0]), &arr(&[-999.0, -999.0])).unwrap();
        assert!(out.values()[0].is_nan());
        assert!(out.values()[1].is_nan());
    }

    #[test]
    fn test_ratio_division_by_zero_and_nan() {
        let out = ratio_with_defaults(
            &arr(&[0.0, 0.0, f32::NAN, 1.0]),
            &arr(&[1.0, 0.0, 1.0, f32::NAN]),
        )
        .unwrap();
        assert!(out.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_ratio_idempotent_on_nan() {
        let nan = arr(&[f32::NAN; 4]);
        let once = ratio_with_defaults(&nan, &nan).unwrap();
        let twice = ratio_with_defaults(&once, &once).unwrap();
        assert!(twice.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_ratio_shape_mismatch() {
        let err = ratio_with_defaults(&arr(&[1.0]), &arr(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, ProcessingError::ShapeMismatch(_)));
    }

    #[test]
    fn test_custom_bounds() {
        let bounds = RatioBounds { min: 0.0, max: 1.0, invalid_sentinel: 0.0 };
        assert!(ratio_value(1.0, 2.0, &bounds).is_nan());
        assert!(ratio_value(-1.0, 0.5, &bounds).is_nan());
        assert_eq!(ratio_value(2.0, 1.0, &bounds), 0.5);
    }
}

//! Calendar helpers for the two on-disk time encodings.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::error::{LidarError, LidarResult};

/// Date assumed when a columnar file carries no calendar attributes.
pub fn fallback_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2006, 1, 1).unwrap_or_default()
}

/// Build a timestamp from the six unsigned fields stored ahead of each
/// binary profile.
pub fn timestamp_from_fields(
    day: u16,
    month: u16,
    year: u16,
    hour: u16,
    minute: u16,
    second: u16,
) -> LidarResult<DateTime<Utc>> {
    let invalid = || {
        LidarError::invalid_time(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        ))
    };
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).ok_or_else(invalid)?;
    let naive = date
        .and_hms_opt(hour as u32, minute as u32, second as u32)
        .ok_or_else(invalid)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Convert fractional hours since midnight of `date` into a timestamp.
///
/// Resolution is one millisecond. Values of 24 or more roll over into the
/// following day.
pub fn hours_of_day_to_timestamp(date: NaiveDate, hours: f64) -> LidarResult<DateTime<Utc>> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(LidarError::invalid_time(format!(
            "hour value {} on {}",
            hours, date
        )));
    }
    let millis = (hours * 3_600_000.0).round() as i64;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| LidarError::invalid_time(date.to_string()))?;
    Ok(Utc.from_utc_datetime(&midnight) + Duration::milliseconds(millis))
}

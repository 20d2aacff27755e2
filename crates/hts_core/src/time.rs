//! Date arithmetic for angular time.

use std::f64::consts::TAU;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;
const EPOCH_YEAR: i32 = 1970;

/// Fractional years elapsed since 1970-01-01T00:00:00Z.
///
/// Whole calendar years plus the elapsed fraction of the current calendar
/// year, so each year counts as exactly one unit whether or not it is a leap
/// year.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use hts_core::fractional_years;
///
/// let ts = Utc.with_ymd_and_hms(2000, 7, 2, 0, 0, 0).unwrap();
/// assert!((fractional_years(ts) - 30.5).abs() < 1e-12);
/// ```
#[must_use]
pub fn fractional_years(timestamp: DateTime<Utc>) -> f64 {
    let year = timestamp.year();
    let days_in_year = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    };
    let seconds = f64::from(timestamp.num_seconds_from_midnight())
        + f64::from(timestamp.nanosecond()) * 1e-9;
    let day = f64::from(timestamp.ordinal0()) + seconds / SECONDS_PER_DAY;
    f64::from(year - EPOCH_YEAR) + day / days_in_year
}

/// Angular time in radians: fractional years scaled by `2π`.
#[must_use]
pub fn angular_time(timestamp: DateTime<Utc>) -> f64 {
    fractional_years(timestamp) * TAU
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fractional_years() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(fractional_years(epoch), 0.0);

        let y2021 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert!((fractional_years(y2021) - 51.0).abs() < 1e-12);

        // day 73 of 365
        let mid = Utc.with_ymd_and_hms(2019, 3, 15, 12, 0, 0).unwrap();
        let expected = 49.0 + (73.0 + 0.5) / 365.0;
        assert!((fractional_years(mid) - expected).abs() < 1e-12);

        let before = Utc.with_ymd_and_hms(1969, 1, 1, 0, 0, 0).unwrap();
        assert!((fractional_years(before) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_angular_time_one_year() {
        let ts = Utc.with_ymd_and_hms(1971, 1, 1, 0, 0, 0).unwrap();
        assert!((angular_time(ts) - TAU).abs() < 1e-12);
    }
}

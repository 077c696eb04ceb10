//! Calendar decomposition of event timestamps.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Calendar breakdown of one event timestamp.
///
/// Timestamps are epoch milliseconds interpreted as UTC with no zone
/// conversion. `week` follows ISO-8601 week numbering and `weekday` runs
/// Monday = 0 through Sunday = 6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBreakdown {
    /// Time of day as "HH:MM:SS.mmm".
    pub start_time: String,
    pub hour: u32,
    /// Day of month.
    pub day: u32,
    /// ISO-8601 week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// Monday = 0 through Sunday = 6.
    pub weekday: u32,
}

impl TimeBreakdown {
    /// Decompose an epoch-milliseconds timestamp. Returns None for values
    /// outside the representable datetime range.
    pub fn from_epoch_millis(ts_ms: i64) -> Option<Self> {
        let dt: DateTime<Utc> = DateTime::from_timestamp_millis(ts_ms)?;
        Some(TimeBreakdown {
            start_time: dt.format("%H:%M:%S%.3f").to_string(),
            hour: dt.hour(),
            day: dt.day(),
            week: dt.iso_week().week(),
            month: dt.month(),
            year: dt.year(),
            weekday: dt.weekday().num_days_from_monday(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_timestamp() {
        // 2018-11-12T02:37:38.796Z, a Monday in ISO week 46.
        let breakdown = TimeBreakdown::from_epoch_millis(1541990258796).unwrap();
        assert_eq!(breakdown.start_time, "02:37:38.796");
        assert_eq!(breakdown.hour, 2);
        assert_eq!(breakdown.day, 12);
        assert_eq!(breakdown.week, 46);
        assert_eq!(breakdown.month, 11);
        assert_eq!(breakdown.year, 2018);
        assert_eq!(breakdown.weekday, 0);
    }

    #[test]
    fn test_epoch_start() {
        // 1970-01-01T00:00:00Z was a Thursday.
        let breakdown = TimeBreakdown::from_epoch_millis(0).unwrap();
        assert_eq!(breakdown.start_time, "00:00:00.000");
        assert_eq!(breakdown.hour, 0);
        assert_eq!(breakdown.day, 1);
        assert_eq!(breakdown.week, 1);
        assert_eq!(breakdown.year, 1970);
        assert_eq!(breakdown.weekday, 3);
    }

    #[test]
    fn test_iso_week_at_year_boundary() {
        // 2019-01-01 is a Tuesday in ISO week 1 of 2019.
        let breakdown = TimeBreakdown::from_epoch_millis(1546300800000).unwrap();
        assert_eq!(breakdown.week, 1);
        assert_eq!(breakdown.month, 1);
        assert_eq!(breakdown.year, 2019);
        assert_eq!(breakdown.weekday, 1);
    }

    #[test]
    fn test_pure_and_range_invariants() {
        for ts in [0i64, 1541990258796, 1546300800000, 999999999999] {
            let first = TimeBreakdown::from_epoch_millis(ts).unwrap();
            let second = TimeBreakdown::from_epoch_millis(ts).unwrap();
            assert_eq!(first, second);
            assert!(first.hour <= 23);
            assert!((1..=31).contains(&first.day));
            assert!((1..=53).contains(&first.week));
            assert!((1..=12).contains(&first.month));
            assert!(first.weekday <= 6);
        }
    }
}

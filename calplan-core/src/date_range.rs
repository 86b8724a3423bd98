//! Week windows for loading and navigation.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

/// Week navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekShift {
    Prev,
    Next,
    Today,
}

/// Half-open window `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Widen by `days` on each side.
    pub fn padded(&self, days: i64) -> DateRange {
        DateRange {
            start: self.start - Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// The ISO week (Monday 00:00 through the end of Sunday) containing `date`.
pub fn week_window(date: NaiveDate) -> DateRange {
    let monday = week_start(date);
    let start = monday.and_time(NaiveTime::MIN).and_utc();
    DateRange {
        start,
        end: start + Duration::weeks(1),
    }
}

/// Move the focused date by one week, or back to `today`.
pub fn shift_week(date: NaiveDate, shift: WeekShift, today: NaiveDate) -> NaiveDate {
    match shift {
        WeekShift::Prev => date - Duration::weeks(1),
        WeekShift::Next => date + Duration::weeks(1),
        WeekShift::Today => today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn window_runs_monday_to_sunday() {
        // 2025-03-20 is a Thursday
        let window = week_window(day(20));
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 24, 0, 0, 0).unwrap());
        assert!(window.contains(Utc.with_ymd_and_hms(2025, 3, 23, 23, 59, 59).unwrap()));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn monday_and_sunday_share_a_window() {
        assert_eq!(week_window(day(17)), week_window(day(23)));
        assert_ne!(week_window(day(23)), week_window(day(24)));
    }

    #[test]
    fn shift_moves_by_whole_weeks() {
        assert_eq!(shift_week(day(20), WeekShift::Prev, day(1)), day(13));
        assert_eq!(shift_week(day(20), WeekShift::Next, day(1)), day(27));
        assert_eq!(shift_week(day(20), WeekShift::Today, day(1)), day(1));
    }

    #[test]
    fn padding_adds_a_week_each_side() {
        let padded = week_window(day(20)).padded(7);
        assert_eq!(padded.start, Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(padded.end, Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap());
    }
}

//! The rolling 7-day window availability is computed for.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// Number of calendar days covered by every run, today included.
pub const HORIZON_DAYS: u32 = 7;

/// Local dates `start ..= start + 6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Horizon {
    start: NaiveDate,
}

impl Horizon {
    pub fn starting(start: NaiveDate) -> Self {
        Self { start }
    }

    /// Horizon beginning at the local date of `now` in `tz`.
    pub fn today_in(tz: Tz, now: DateTime<Utc>) -> Self {
        Self::starting(now.with_timezone(&tz).date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date included.
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(HORIZON_DAYS as i64 - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..HORIZON_DAYS as i64).map(move |offset| start + Duration::days(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dates_cover_seven_days() {
        let horizon = Horizon::starting(NaiveDate::from_ymd_opt(2024, 12, 28).unwrap());
        let dates: Vec<_> = horizon.dates().collect();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 12, 28).unwrap());
        assert_eq!(dates[6], NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(horizon.end(), dates[6]);
    }

    #[test]
    fn test_contains_bounds() {
        let horizon = Horizon::starting(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert!(horizon.contains(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));
        assert!(horizon.contains(NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()));
        assert!(!horizon.contains(NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()));
        assert!(!horizon.contains(NaiveDate::from_ymd_opt(2024, 1, 17).unwrap()));
    }

    #[test]
    fn test_today_uses_local_date() {
        // 02:30 UTC on Jan 11 is still Jan 10 in New York
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 2, 30, 0).unwrap();
        let horizon = Horizon::today_in(chrono_tz::America::New_York, now);
        assert_eq!(horizon.start(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }
}

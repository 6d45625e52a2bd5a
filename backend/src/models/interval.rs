//! Trusted, normalized interval types derived by the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Court, TimeOfDay};

/// A validated busy range on one court and one local date. `start < end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusyInterval {
    pub court: Court,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl BusyInterval {
    /// Returns `None` unless `start < end`.
    pub fn new(court: Court, date: NaiveDate, start: TimeOfDay, end: TimeOfDay) -> Option<Self> {
        (start < end).then_some(Self {
            court,
            date,
            start,
            end,
        })
    }

    pub fn duration_minutes(&self) -> i32 {
        self.start.minutes_until(self.end)
    }
}

/// A maximal free range inside the operating window. `start < end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreeSlot {
    pub court: Court,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl FreeSlot {
    pub fn duration_minutes(&self) -> i32 {
        self.start.minutes_until(self.end)
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }
}

/// A calendar entry recognized as the configured open-play event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BadmintonSession {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court: Option<Court>,
}

/// Whether the availability for a (court, date) is backed by data.
///
/// `Unknown` days come from a source that could not deliver that court or
/// date; they are computed as fully free but must not be read as verified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    #[default]
    Verified,
    Unknown,
}

impl DayStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, DayStatus::Verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u16, m: u16) -> TimeOfDay {
        TimeOfDay::from_hm(h, m).unwrap()
    }

    #[test]
    fn test_busy_interval_requires_ordering() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert!(BusyInterval::new(Court::new("Court 1"), date, t(10, 0), t(9, 0)).is_none());
        assert!(BusyInterval::new(Court::new("Court 1"), date, t(10, 0), t(10, 0)).is_none());
        let busy = BusyInterval::new(Court::new("Court 1"), date, t(10, 0), t(11, 30)).unwrap();
        assert_eq!(busy.duration_minutes(), 90);
    }

    #[test]
    fn test_free_slot_duration_hours() {
        let slot = FreeSlot {
            court: Court::new("Court 1"),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            start: t(6, 0),
            end: t(9, 30),
        };
        assert_eq!(slot.duration_minutes(), 210);
        assert!((slot.duration_hours() - 3.5).abs() < f64::EPSILON);
    }
}

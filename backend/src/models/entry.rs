//! Untrusted calendar entries as produced by a source.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A timestamp as the source delivered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawTime {
    /// Absolute instant with an explicit offset (UTC included).
    Zoned(DateTime<FixedOffset>),
    /// Date and time without zone information; read as local wall-clock time.
    Floating(NaiveDateTime),
    /// Time of day only; the entry's `date` supplies the calendar day.
    WallClock(NaiveTime),
}

/// One raw calendar entry. Nothing here is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub title: Option<String>,
    pub court: Option<String>,
    pub date: Option<NaiveDate>,
    pub start: Option<RawTime>,
    pub end: Option<RawTime>,
}

impl RawEntry {
    /// Entry carrying a date plus wall-clock start and end, the shape a
    /// scraped schedule grid produces.
    pub fn wall_clock(
        title: impl Into<String>,
        court: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self {
            title: Some(title.into()),
            court: Some(court.into()),
            date: Some(date),
            start: Some(RawTime::WallClock(start)),
            end: Some(RawTime::WallClock(end)),
        }
    }

    /// Entry carrying absolute instants, the shape an iCal feed produces.
    pub fn zoned(
        title: impl Into<String>,
        court: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            court: Some(court.into()),
            date: None,
            start: Some(RawTime::Zoned(start)),
            end: Some(RawTime::Zoned(end)),
        }
    }

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }
}

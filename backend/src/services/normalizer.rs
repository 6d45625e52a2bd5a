//! Raw entries to canonical busy intervals.
//!
//! Every raw entry is resolved to local wall-clock time in the configured
//! timezone, checked against the court set, split at midnight into one piece
//! per calendar day, and filed under its (court, date). Entries that cannot
//! be trusted are dropped and counted by [`MalformedReason`]; nothing here is
//! fatal.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{BusyInterval, Court, CourtSet, RawEntry, RawTime, TimeOfDay};

use super::horizon::Horizon;

/// Why an entry was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    MissingCourt,
    UnknownCourt,
    MissingTimestamp,
    /// Wall-clock times without a calendar date.
    MissingDate,
    /// End not after start.
    Inverted,
    /// Local time skipped by a DST transition.
    NonexistentLocalTime,
    /// Ordered, but under a minute long once truncated to minutes.
    TooShort,
}

impl MalformedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MalformedReason::MissingCourt => "missing court",
            MalformedReason::UnknownCourt => "unknown court",
            MalformedReason::MissingTimestamp => "missing or unparseable timestamp",
            MalformedReason::MissingDate => "missing date",
            MalformedReason::Inverted => "end not after start",
            MalformedReason::NonexistentLocalTime => "nonexistent local time",
            MalformedReason::TooShort => "shorter than a minute",
        }
    }
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected while normalizing one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub total: usize,
    /// Entries with at least one piece inside the horizon.
    pub accepted: usize,
    pub missing_court: usize,
    pub unknown_court: usize,
    pub missing_timestamp: usize,
    pub missing_date: usize,
    pub inverted: usize,
    pub nonexistent_local_time: usize,
    pub too_short: usize,
    /// Valid entries, or parts of them, falling outside the horizon.
    pub out_of_horizon: usize,
}

impl NormalizationStats {
    fn record(&mut self, reason: MalformedReason) {
        let counter = match reason {
            MalformedReason::MissingCourt => &mut self.missing_court,
            MalformedReason::UnknownCourt => &mut self.unknown_court,
            MalformedReason::MissingTimestamp => &mut self.missing_timestamp,
            MalformedReason::MissingDate => &mut self.missing_date,
            MalformedReason::Inverted => &mut self.inverted,
            MalformedReason::NonexistentLocalTime => &mut self.nonexistent_local_time,
            MalformedReason::TooShort => &mut self.too_short,
        };
        *counter += 1;
    }

    pub fn count(&self, reason: MalformedReason) -> usize {
        match reason {
            MalformedReason::MissingCourt => self.missing_court,
            MalformedReason::UnknownCourt => self.unknown_court,
            MalformedReason::MissingTimestamp => self.missing_timestamp,
            MalformedReason::MissingDate => self.missing_date,
            MalformedReason::Inverted => self.inverted,
            MalformedReason::NonexistentLocalTime => self.nonexistent_local_time,
            MalformedReason::TooShort => self.too_short,
        }
    }

    /// Total number of discarded entries.
    pub fn malformed(&self) -> usize {
        self.missing_court
            + self.unknown_court
            + self.missing_timestamp
            + self.missing_date
            + self.inverted
            + self.nonexistent_local_time
            + self.too_short
    }
}

/// A validated entry kept for classification. `pieces` is never empty and
/// holds only dates inside the horizon, in chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedEntry {
    pub title: Option<String>,
    pub court: Court,
    pub pieces: Vec<BusyInterval>,
}

impl AcceptedEntry {
    pub fn first_piece(&self) -> &BusyInterval {
        &self.pieces[0]
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedEntries {
    /// Unordered busy intervals for every court and horizon date.
    pub busy: BTreeMap<(Court, NaiveDate), Vec<BusyInterval>>,
    pub accepted: Vec<AcceptedEntry>,
    pub stats: NormalizationStats,
}

impl NormalizedEntries {
    pub fn busy_for(&self, court: &Court, date: NaiveDate) -> &[BusyInterval] {
        self.busy
            .get(&(court.clone(), date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub struct Normalizer<'a> {
    timezone: Tz,
    courts: &'a CourtSet,
    horizon: Horizon,
}

impl<'a> Normalizer<'a> {
    pub fn new(timezone: Tz, courts: &'a CourtSet, horizon: Horizon) -> Self {
        Self {
            timezone,
            courts,
            horizon,
        }
    }

    pub fn normalize(&self, entries: Vec<RawEntry>) -> NormalizedEntries {
        let mut out = NormalizedEntries::default();
        for court in self.courts.iter() {
            for date in self.horizon.dates() {
                out.busy.insert((court.clone(), date), Vec::new());
            }
        }
        out.stats.total = entries.len();

        for entry in entries {
            let (court, start, end) = match self.validate(&entry) {
                Ok(resolved) => resolved,
                Err(reason) => {
                    warn!(
                        "Discarding entry '{}' on {}: {}",
                        entry.title_or_default(),
                        entry.court.as_deref().unwrap_or("?"),
                        reason
                    );
                    out.stats.record(reason);
                    continue;
                }
            };

            let (pieces, dropped) = self.split_days(&court, start, end);
            out.stats.out_of_horizon += dropped;
            if pieces.is_empty() {
                if dropped == 0 {
                    warn!(
                        "Discarding entry '{}' on {}: {}",
                        entry.title_or_default(),
                        court,
                        MalformedReason::TooShort
                    );
                    out.stats.record(MalformedReason::TooShort);
                }
                continue;
            }
            for piece in &pieces {
                out.busy
                    .entry((court.clone(), piece.date))
                    .or_default()
                    .push(piece.clone());
            }
            out.stats.accepted += 1;
            out.accepted.push(AcceptedEntry {
                title: entry.title,
                court,
                pieces,
            });
        }

        info!(
            "Normalized {} entries: {} accepted, {} malformed, {} out of horizon",
            out.stats.total,
            out.stats.accepted,
            out.stats.malformed(),
            out.stats.out_of_horizon
        );
        out
    }

    /// Resolve court and local start/end, or say why the entry is unusable.
    fn validate(
        &self,
        entry: &RawEntry,
    ) -> Result<(Court, NaiveDateTime, NaiveDateTime), MalformedReason> {
        let raw_court = entry
            .court
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(MalformedReason::MissingCourt)?;
        let court = self
            .courts
            .resolve(raw_court)
            .cloned()
            .ok_or(MalformedReason::UnknownCourt)?;

        let (Some(raw_start), Some(raw_end)) = (entry.start, entry.end) else {
            return Err(MalformedReason::MissingTimestamp);
        };
        let (start, mut end) = match (raw_start, raw_end) {
            (RawTime::Zoned(s), RawTime::Zoned(e)) => {
                if e <= s {
                    return Err(MalformedReason::Inverted);
                }
                let start = s.with_timezone(&self.timezone).naive_local();
                let end = e.with_timezone(&self.timezone).naive_local();
                // Across a fall-back transition the local end can repeat an
                // earlier wall-clock time; keep the real duration instead.
                if end <= start {
                    (start, start + (e - s))
                } else {
                    (start, end)
                }
            }
            _ => (
                self.resolve_local(raw_start, entry.date)?,
                self.resolve_local(raw_end, entry.date)?,
            ),
        };

        // "until 12AM" on a grid means the midnight closing the day.
        if let RawTime::WallClock(time) = raw_end {
            if time == NaiveTime::MIN && end <= start {
                end += Duration::days(1);
            }
        }

        if end <= start {
            return Err(MalformedReason::Inverted);
        }
        Ok((court, start, end))
    }

    fn resolve_local(
        &self,
        time: RawTime,
        date: Option<NaiveDate>,
    ) -> Result<NaiveDateTime, MalformedReason> {
        let local = match time {
            RawTime::Zoned(dt) => return Ok(dt.with_timezone(&self.timezone).naive_local()),
            RawTime::Floating(naive) => naive,
            RawTime::WallClock(t) => date.ok_or(MalformedReason::MissingDate)?.and_time(t),
        };
        match self.timezone.from_local_datetime(&local) {
            LocalResult::None => Err(MalformedReason::NonexistentLocalTime),
            _ => Ok(local),
        }
    }

    /// One busy piece per calendar day inside the horizon, plus the number
    /// of portions that fell outside it.
    fn split_days(
        &self,
        court: &Court,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> (Vec<BusyInterval>, usize) {
        let window_start = self.horizon.start().and_time(NaiveTime::MIN);
        let window_end = (self.horizon.end() + Duration::days(1)).and_time(NaiveTime::MIN);

        let mut dropped = 0;
        if start < window_start {
            dropped += 1;
        }
        if end > window_end {
            dropped += 1;
        }
        let mut cursor = start.max(window_start);
        let end = end.min(window_end);

        let mut pieces = Vec::new();
        while cursor < end {
            let date = cursor.date();
            let day_end = (date + Duration::days(1)).and_time(NaiveTime::MIN);
            let piece_end = end.min(day_end);
            let end_tod = if piece_end == day_end {
                TimeOfDay::END_OF_DAY
            } else {
                TimeOfDay::from_naive_time(piece_end.time())
            };
            let start_tod = TimeOfDay::from_naive_time(cursor.time());
            // Sub-minute pieces collapse to nothing and are skipped.
            if let Some(piece) = BusyInterval::new(court.clone(), date, start_tod, end_tod) {
                pieces.push(piece);
            }
            cursor = piece_end;
        }
        (pieces, dropped)
    }
}

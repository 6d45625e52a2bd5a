//! The `gaps.json` report.
//!
//! The report holds an entry for every configured court and every horizon
//! date, fully booked days included. Apart from `last_updated`, which the
//! caller supplies, it is a pure function of its inputs; the fingerprint
//! hashes the courts and sessions so unchanged data yields an unchanged
//! fingerprint from run to run.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::GapResult;
use crate::models::{BadmintonSession, Court, DayStatus, TimeOfDay};
use crate::sources::SourceHealth;

use super::gaps::DayAvailability;
use super::normalizer::NormalizationStats;

pub const UNKNOWN_DAY_NOTE: &str = "no schedule data; assumed open";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotReport {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    /// Rounded to one decimal.
    pub duration_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    /// Present only for days without verified data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DayStatus>,
    pub slots: Vec<SlotReport>,
}

impl DayReport {
    pub fn is_unknown(&self) -> bool {
        self.status == Some(DayStatus::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub last_updated: String,
    pub timezone: String,
    pub fingerprint: String,
    pub courts: BTreeMap<Court, Vec<DayReport>>,
    pub badminton_open_play: Vec<BadmintonSession>,
    /// Run diagnostics; logged, never written.
    #[serde(skip)]
    pub stats: NormalizationStats,
}

impl Report {
    pub fn to_json_pretty(&self) -> GapResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn total_slots(&self, court: &Court) -> usize {
        self.courts
            .get(court)
            .map(|days| days.iter().map(|d| d.slots.len()).sum())
            .unwrap_or(0)
    }
}

/// ISO-8601 UTC, second precision, `Z` suffix.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Hours with one decimal, e.g. 95 minutes -> 1.6.
pub fn round_hours(minutes: i32) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}

/// SHA-256 hex digest of `content`.
pub fn calculate_fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct ReportAssembler {
    timezone: Tz,
    min_slot_minutes: u32,
}

impl ReportAssembler {
    pub fn new(timezone: Tz, min_slot_minutes: u32) -> Self {
        Self {
            timezone,
            min_slot_minutes,
        }
    }

    fn day_report(&self, day: &DayAvailability, status: DayStatus) -> DayReport {
        let slots = day
            .free
            .iter()
            .map(|slot| {
                let minutes = slot.duration_minutes();
                let note = if !status.is_verified() {
                    Some(UNKNOWN_DAY_NOTE.to_string())
                } else if (minutes as i64) < self.min_slot_minutes as i64 {
                    Some(format!("shorter than {} min", self.min_slot_minutes))
                } else {
                    None
                };
                SlotReport {
                    start: slot.start,
                    end: slot.end,
                    duration_hours: round_hours(minutes),
                    note,
                }
            })
            .collect();
        DayReport {
            date: day.date,
            status: (!status.is_verified()).then_some(status),
            slots,
        }
    }

    pub fn assemble(
        &self,
        days: &BTreeMap<(Court, NaiveDate), DayAvailability>,
        sessions: Vec<BadmintonSession>,
        health: &SourceHealth,
        stats: NormalizationStats,
        now: DateTime<Utc>,
    ) -> GapResult<Report> {
        let mut courts: BTreeMap<Court, Vec<DayReport>> = BTreeMap::new();
        // The map is keyed by (court, date), so each court's days arrive in date order.
        for ((court, date), day) in days {
            let status = if health.is_unavailable(court, *date) {
                DayStatus::Unknown
            } else {
                DayStatus::Verified
            };
            courts
                .entry(court.clone())
                .or_default()
                .push(self.day_report(day, status));
        }

        let canonical = serde_json::to_string(&(&courts, &sessions))?;
        Ok(Report {
            last_updated: format_timestamp(now),
            timezone: self.timezone.name().to_string(),
            fingerprint: calculate_fingerprint(&canonical),
            courts,
            badminton_open_play: sessions,
            stats,
        })
    }
}

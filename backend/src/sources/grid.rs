//! Schedule-grid dump source.
//!
//! An external scraper saves the `aria-label` text of every grid item it
//! sees, grouped by court, into a JSON file:
//!
//! ```json
//! {"courts": [{"court": "Court 1", "labels": ["..."], "error": null}]}
//! ```
//!
//! Labels look like `"Volleyball, Mon Jan 19 2026 from 9:05AM until 11AM"`.
//! A label that does not match is still passed on (without timestamps) so
//! the normalizer counts it as malformed.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Court, CourtSet, RawEntry, RawTime};
use crate::services::horizon::Horizon;

use super::{RawEntrySource, SourceHealth, SourceOutcome, Unavailable};

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([a-z]+,?\s+[a-z]+\.?,?\s+\d{1,2},?\s+\d{4})\s+from\s+(\d{1,2}(?::\d{2})?\s*[ap]\.?m\.?)\s+until\s+(\d{1,2}(?::\d{2})?\s*[ap]\.?m\.?)",
    )
    .expect("label pattern is valid")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\.?$").expect("time pattern is valid")
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridDump {
    #[serde(default)]
    pub courts: Vec<GridDumpCourt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDumpCourt {
    pub court: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Set by the scraper when the page for this court could not be read.
    #[serde(default)]
    pub error: Option<String>,
}

/// The pieces of one grid item label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLabel {
    pub title: Option<String>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Parse `9:05AM`, `11AM`, `12 pm` and similar into a time of day.
pub fn parse_12h_time(input: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(input.trim())?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("p");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parse `Mon Jan 19 2026`, also with commas (`Mon, Jan 19, 2026`).
pub fn parse_label_date(input: &str) -> Option<NaiveDate> {
    let cleaned = input.replace([',', '.'], " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDate::parse_from_str(&cleaned, "%a %b %d %Y").ok()
}

/// Parse a full grid item label. `None` when the date or times are missing.
pub fn parse_label(label: &str) -> Option<GridLabel> {
    let caps = LABEL_RE.captures(label)?;
    let whole = caps.get(0)?;
    let date = parse_label_date(caps.get(1)?.as_str())?;
    let start = parse_12h_time(caps.get(2)?.as_str())?;
    let end = parse_12h_time(caps.get(3)?.as_str())?;

    let prefix = &label[..whole.start()];
    let title = prefix
        .split(',')
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Some(GridLabel {
        title,
        date,
        start,
        end,
    })
}

fn label_to_entry(label: &str, court: &str) -> RawEntry {
    match parse_label(label) {
        Some(parsed) => RawEntry {
            title: parsed.title,
            court: Some(court.to_string()),
            date: Some(parsed.date),
            start: Some(RawTime::WallClock(parsed.start)),
            end: Some(RawTime::WallClock(parsed.end)),
        },
        None => {
            debug!("Unrecognized grid label on {}: {}", court, label);
            RawEntry {
                title: Some(label.trim().to_string()),
                court: Some(court.to_string()),
                ..RawEntry::default()
            }
        }
    }
}

/// Source reading a scraped grid dump from disk.
pub struct GridDumpSource {
    path: PathBuf,
    courts: CourtSet,
}

impl GridDumpSource {
    pub fn new(path: impl Into<PathBuf>, courts: CourtSet) -> Self {
        Self {
            path: path.into(),
            courts,
        }
    }

    /// Turn a parsed dump into an outcome for the configured courts.
    pub fn outcome_from_dump(&self, dump: GridDump) -> SourceOutcome {
        let mut entries = Vec::new();
        let mut unavailable = Vec::new();
        let mut seen: Vec<Court> = Vec::new();

        for page in dump.courts {
            let resolved = self.courts.resolve(&page.court);
            if let Some(error) = page.error.as_deref().filter(|e| !e.trim().is_empty()) {
                match resolved {
                    Some(court) => {
                        warn!("Grid page for {} failed: {}", court, error);
                        unavailable.push(Unavailable::court(court.clone(), error));
                        seen.push(court.clone());
                    }
                    None => warn!("Grid page for unknown court '{}' failed: {}", page.court, error),
                }
                continue;
            }
            if let Some(court) = resolved {
                seen.push(court.clone());
            }
            entries.extend(page.labels.iter().map(|label| label_to_entry(label, &page.court)));
        }

        for court in self.courts.iter() {
            if !seen.contains(court) {
                warn!("Grid dump has no page for {}", court);
                unavailable.push(Unavailable::court(court.clone(), "missing from grid dump"));
            }
        }

        let courts: Vec<Court> = self.courts.iter().cloned().collect();
        SourceOutcome {
            entries,
            health: SourceHealth::from_unavailable(unavailable, &courts, 1),
        }
    }
}

#[async_trait]
impl RawEntrySource for GridDumpSource {
    fn name(&self) -> &str {
        "grid"
    }

    async fn fetch(&self, horizon: &Horizon) -> SourceOutcome {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) => {
                return SourceOutcome::failure(
                    1,
                    format!("cannot read grid dump {}: {}", self.path.display(), e),
                )
            }
        };
        let dump: GridDump = match serde_json::from_str(&text) {
            Ok(dump) => dump,
            Err(e) => {
                return SourceOutcome::failure(
                    1,
                    format!("invalid grid dump {}: {}", self.path.display(), e),
                )
            }
        };
        let outcome = self.outcome_from_dump(dump);
        info!(
            "Read {} grid label(s) from {} for {} to {}",
            outcome.entries.len(),
            self.path.display(),
            horizon.start(),
            horizon.end()
        );
        outcome
    }
}

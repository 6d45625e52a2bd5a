//! Raw entry sources.
//!
//! A source hands the engine a finite batch of [`RawEntry`] values plus a
//! health signal. Retrying is the source's business: by the time a
//! [`SourceOutcome`] is returned, every retry has already happened.
//!
//! - [`ical`]: per-court iCal feeds (HTTP or local files)
//! - [`grid`]: dumps of scraped schedule-grid labels
//! - [`retry`]: the bounded retry policy shared by sources

pub mod grid;
pub mod ical;
pub mod retry;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Court, RawEntry};
use crate::services::horizon::Horizon;

pub use grid::GridDumpSource;
pub use self::ical::{FeedFetcher, IcalFeedSource};
pub use retry::RetryPolicy;

/// A court (and optionally a single date) the source could not deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unavailable {
    pub court: Court,
    /// `None` means the whole horizon for that court.
    pub date: Option<NaiveDate>,
    pub reason: String,
}

impl Unavailable {
    pub fn court(court: Court, reason: impl Into<String>) -> Self {
        Self {
            court,
            date: None,
            reason: reason.into(),
        }
    }

    pub fn covers(&self, court: &Court, date: NaiveDate) -> bool {
        &self.court == court && self.date.map_or(true, |d| d == date)
    }
}

/// How well the fetch went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceHealth {
    Success,
    Partial { unavailable: Vec<Unavailable> },
    Failure { attempts: u32, reason: String },
}

impl SourceHealth {
    /// Derive the health from what could not be fetched.
    ///
    /// Every court missing for the whole horizon is a total failure; anything
    /// less is partial.
    pub fn from_unavailable(unavailable: Vec<Unavailable>, courts: &[Court], attempts: u32) -> Self {
        if unavailable.is_empty() {
            return SourceHealth::Success;
        }
        let all_missing = !courts.is_empty()
            && courts
                .iter()
                .all(|c| unavailable.iter().any(|u| &u.court == c && u.date.is_none()));
        if all_missing {
            let reason = unavailable
                .iter()
                .map(|u| format!("{}: {}", u.court, u.reason))
                .collect::<Vec<_>>()
                .join("; ");
            SourceHealth::Failure { attempts, reason }
        } else {
            SourceHealth::Partial { unavailable }
        }
    }

    /// Whether `(court, date)` has no data behind it.
    pub fn is_unavailable(&self, court: &Court, date: NaiveDate) -> bool {
        match self {
            SourceHealth::Success => false,
            SourceHealth::Partial { unavailable } => unavailable.iter().any(|u| u.covers(court, date)),
            SourceHealth::Failure { .. } => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceHealth::Success => "success",
            SourceHealth::Partial { .. } => "partial",
            SourceHealth::Failure { .. } => "failure",
        }
    }
}

/// Everything a source produced for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub entries: Vec<RawEntry>,
    pub health: SourceHealth,
}

impl SourceOutcome {
    pub fn success(entries: Vec<RawEntry>) -> Self {
        Self {
            entries,
            health: SourceHealth::Success,
        }
    }

    pub fn failure(attempts: u32, reason: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            health: SourceHealth::Failure {
                attempts,
                reason: reason.into(),
            },
        }
    }
}

/// Producer of raw calendar entries for a horizon.
#[async_trait]
pub trait RawEntrySource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self, horizon: &Horizon) -> SourceOutcome;
}

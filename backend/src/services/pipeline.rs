//! One run of the engine: normalize, compute gaps, classify, assemble.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{GapError, GapResult};
use crate::sources::{SourceHealth, SourceOutcome};

use super::classifier::EventClassifier;
use super::gaps::compute_all;
use super::horizon::Horizon;
use super::normalizer::Normalizer;
use super::report::{Report, ReportAssembler};

pub struct Pipeline<'a> {
    config: &'a AppConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// Turn a source outcome into a report.
    ///
    /// A total source failure with no entries at all is an error and nothing
    /// should be written. Any other outcome produces a report, with the days
    /// the source could not deliver marked unknown.
    pub fn run(&self, outcome: SourceOutcome, horizon: Horizon, now: DateTime<Utc>) -> GapResult<Report> {
        let SourceOutcome { entries, health } = outcome;

        match &health {
            SourceHealth::Failure { attempts, reason } if entries.is_empty() => {
                return Err(GapError::SourceFailed {
                    attempts: *attempts,
                    reason: reason.clone(),
                });
            }
            SourceHealth::Failure { reason, .. } => {
                warn!("Source failed but delivered {} entries; reporting best effort: {}", entries.len(), reason);
            }
            SourceHealth::Partial { unavailable } => {
                for gap in unavailable {
                    match gap.date {
                        Some(date) => warn!("No data for {} on {}: {}", gap.court, date, gap.reason),
                        None => warn!("No data for {}: {}", gap.court, gap.reason),
                    }
                }
            }
            SourceHealth::Success => {}
        }

        let courts = self.config.court_set();
        let normalized = Normalizer::new(self.config.timezone, &courts, horizon).normalize(entries);

        let days = compute_all(&normalized, &self.config.hours);
        let sessions = EventClassifier::new(&self.config.target_phrase).classify(&normalized.accepted);
        info!(
            "Computed {} court-days for {} to {}; {} open-play session(s)",
            days.len(),
            horizon.start(),
            horizon.end(),
            sessions.len()
        );

        ReportAssembler::new(self.config.timezone, self.config.min_slot_minutes).assemble(
            &days,
            sessions,
            &health,
            normalized.stats,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawEntry;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn config() -> AppConfig {
        AppConfig::with_courts(["Court 1", "Court 2", "Court 3"]).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn horizon() -> Horizon {
        Horizon::starting(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
    }

    #[test]
    fn test_total_failure_without_entries_is_error() {
        let config = config();
        let err = Pipeline::new(&config)
            .run(SourceOutcome::failure(3, "all feeds down"), horizon(), now())
            .unwrap_err();
        assert!(matches!(err, GapError::SourceFailed { attempts: 3, .. }));
    }

    #[test]
    fn test_report_is_structurally_complete() {
        let config = config();
        let entry = RawEntry::wall_clock(
            "Badminton Club Open Play",
            "Court 2",
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        );
        let report = Pipeline::new(&config)
            .run(SourceOutcome::success(vec![entry]), horizon(), now())
            .unwrap();
        assert_eq!(report.courts.len(), 3);
        assert!(report.courts.values().all(|days| days.len() == 7));
        assert_eq!(report.badminton_open_play.len(), 1);
        assert_eq!(report.stats.accepted, 1);
    }
}

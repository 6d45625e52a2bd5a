//! # Court Gap Finder
//!
//! Availability and gap engine for a small set of bookable courts.
//!
//! Given raw calendar entries for the next seven days, the engine works out
//! when each court is free inside its operating hours, flags the
//! "Badminton Club Open Play" sessions, and writes everything to a
//! structurally complete `gaps.json` report.
//!
//! ## Architecture
//!
//! - [`sources`]: raw entry producers (per-court iCal feeds, scraped grid dumps)
//!   and their retry policy
//! - [`services`]: normalizer, gap calculator, classifier, report assembler,
//!   and the [`services::Pipeline`] that wires them
//! - [`models`]: courts, times of day, raw entries and derived intervals
//! - [`config`]: TOML configuration validated into an immutable [`config::AppConfig`]
//! - [`io`]: report file writing and the console summary
//! - [`error`]: run-level error types
//!
//! ## Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
//! use court_gaps::config::AppConfig;
//! use court_gaps::models::RawEntry;
//! use court_gaps::services::{Horizon, Pipeline};
//! use court_gaps::sources::SourceOutcome;
//!
//! let config = AppConfig::with_courts(["Court 1"]).unwrap();
//! let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let entry = RawEntry::wall_clock(
//!     "Volleyball",
//!     "Court 1",
//!     today,
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
//! );
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
//! let report = Pipeline::new(&config)
//!     .run(SourceOutcome::success(vec![entry]), Horizon::starting(today), now)
//!     .unwrap();
//!
//! let first_day = &report.courts.values().next().unwrap()[0];
//! assert_eq!(first_day.slots.len(), 2); // 06:00-09:00 and 11:00-23:00
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod services;
pub mod sources;

pub use error::{GapError, GapResult};

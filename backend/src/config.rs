//! Run configuration loaded from a TOML file.
//!
//! The file is read once at process start, validated into an immutable
//! [`AppConfig`], and passed explicitly to every component. A couple of
//! environment variables can override file values:
//!
//! - `COURT_GAPS_CONFIG`: config file path (when none is given explicitly)
//! - `COURT_GAPS_TIMEZONE`: IANA timezone name
//! - `COURT_GAPS_OUTPUT`: report output path

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{Court, CourtSet, TimeOfDay};
use crate::services::horizon::HORIZON_DAYS;
use crate::sources::retry::RetryPolicy;

pub const CONFIG_ENV: &str = "COURT_GAPS_CONFIG";
pub const TIMEZONE_ENV: &str = "COURT_GAPS_TIMEZONE";
pub const OUTPUT_ENV: &str = "COURT_GAPS_OUTPUT";

/// On-disk configuration, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default)]
    pub hours: HoursSettings,
    #[serde(default)]
    pub courts: Vec<CourtSettings>,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoursSettings {
    #[serde(default = "default_open")]
    pub open: String,
    #[serde(default = "default_close")]
    pub close: String,
    /// Per-weekday overrides keyed by `mon`..`sun`.
    #[serde(default)]
    pub weekdays: HashMap<String, WindowSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtSettings {
    pub name: String,
    #[serde(default)]
    pub ical_url: Option<String>,
    #[serde(default)]
    pub ical_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default = "default_target_phrase")]
    pub target_phrase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_min_slot_minutes")]
    pub min_slot_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_horizon_days() -> u32 {
    HORIZON_DAYS
}

fn default_open() -> String {
    "06:00".to_string()
}

fn default_close() -> String {
    "23:00".to_string()
}

fn default_target_phrase() -> String {
    "Badminton Club Open Play".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("gaps.json")
}

fn default_min_slot_minutes() -> u32 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HoursSettings {
    fn default() -> Self {
        Self {
            open: default_open(),
            close: default_close(),
            weekdays: HashMap::new(),
        }
    }
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            target_phrase: default_target_phrase(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            min_slot_minutes: default_min_slot_minutes(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConfigFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            file.resolve_feed_paths(base);
        }
        Ok(file)
    }

    /// Relative `ical_path` values are taken relative to the config file.
    fn resolve_feed_paths(&mut self, base: &Path) {
        for court in &mut self.courts {
            if let Some(feed) = court.ical_path.as_mut() {
                if feed.is_relative() {
                    *feed = base.join(&*feed);
                }
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Searches for `court-gaps.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("court-gaps.toml"),
            PathBuf::from("backend/court-gaps.toml"),
            PathBuf::from("../court-gaps.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Apply `COURT_GAPS_TIMEZONE` and `COURT_GAPS_OUTPUT` when set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(tz) = env::var(TIMEZONE_ENV) {
            if !tz.trim().is_empty() {
                self.timezone = tz.trim().to_string();
            }
        }
        if let Ok(output) = env::var(OUTPUT_ENV) {
            if !output.trim().is_empty() {
                self.report.output_path = PathBuf::from(output.trim());
            }
        }
    }

    /// Validate everything and produce the immutable run configuration.
    pub fn validate(self) -> Result<AppConfig, ConfigError> {
        let timezone: Tz = self.timezone.trim().parse().map_err(|_| {
            ConfigError::invalid("timezone", format!("unknown timezone '{}'", self.timezone))
        })?;

        if self.horizon_days != HORIZON_DAYS {
            return Err(ConfigError::invalid(
                "horizon_days",
                format!("horizon is fixed at {} days, got {}", HORIZON_DAYS, self.horizon_days),
            ));
        }

        let default_window = OperatingWindow::parse(&self.hours.open, &self.hours.close, "hours")?;
        let mut weekdays = HashMap::new();
        for (key, window) in &self.hours.weekdays {
            let day: Weekday = key.parse().map_err(|_| {
                ConfigError::invalid(format!("hours.weekdays.{}", key), "not a weekday name")
            })?;
            let field = format!("hours.weekdays.{}", key);
            weekdays.insert(day, OperatingWindow::parse(&window.open, &window.close, &field)?);
        }

        if self.courts.is_empty() {
            return Err(ConfigError::invalid("courts", "at least one court is required"));
        }
        let mut courts = Vec::with_capacity(self.courts.len());
        for settings in self.courts {
            let name = settings.name.trim().to_string();
            if name.is_empty() {
                return Err(ConfigError::invalid("courts.name", "court name must not be empty"));
            }
            if courts
                .iter()
                .any(|c: &CourtConfig| c.court.as_str().eq_ignore_ascii_case(&name))
            {
                return Err(ConfigError::invalid(
                    "courts.name",
                    format!("duplicate court '{}'", name),
                ));
            }
            let feed = match (settings.ical_url, settings.ical_path) {
                (Some(_), Some(_)) => {
                    return Err(ConfigError::invalid(
                        format!("courts.{}", name),
                        "set either ical_url or ical_path, not both",
                    ))
                }
                (Some(url), None) => Some(FeedLocation::Url(url)),
                (None, Some(path)) => Some(FeedLocation::Path(path)),
                (None, None) => None,
            };
            courts.push(CourtConfig {
                court: Court::new(name),
                feed,
            });
        }

        let target_phrase = self.classifier.target_phrase.trim().to_string();
        if target_phrase.is_empty() {
            return Err(ConfigError::invalid(
                "classifier.target_phrase",
                "must not be empty",
            ));
        }

        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::invalid("fetch.max_attempts", "must be at least 1"));
        }

        Ok(AppConfig {
            timezone,
            hours: OperatingHours {
                default: default_window,
                weekdays,
            },
            courts,
            target_phrase,
            output_path: self.report.output_path,
            min_slot_minutes: self.report.min_slot_minutes,
            retry: RetryPolicy::new(
                self.fetch.max_attempts,
                self.fetch.base_delay_ms,
                self.fetch.max_delay_ms,
            ),
            fetch_timeout_secs: self.fetch.timeout_secs,
        })
    }
}

/// Where a court's iCal feed lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLocation {
    Url(String),
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtConfig {
    pub court: Court,
    pub feed: Option<FeedLocation>,
}

/// Daily `[open, close)` bounds within which availability is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatingWindow {
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl OperatingWindow {
    /// Returns `None` unless `open < close`.
    pub fn new(open: TimeOfDay, close: TimeOfDay) -> Option<Self> {
        (open < close).then_some(Self { open, close })
    }

    fn parse(open: &str, close: &str, field: &str) -> Result<Self, ConfigError> {
        let open: TimeOfDay = open
            .parse()
            .map_err(|e| ConfigError::invalid(format!("{}.open", field), format!("{}", e)))?;
        let close: TimeOfDay = close
            .parse()
            .map_err(|e| ConfigError::invalid(format!("{}.close", field), format!("{}", e)))?;
        Self::new(open, close).ok_or_else(|| {
            ConfigError::invalid(
                field,
                format!("open ({}) must be before close ({})", open, close),
            )
        })
    }

    pub fn duration_minutes(&self) -> i32 {
        self.open.minutes_until(self.close)
    }

    /// Intersect `[start, end)` with the window; `None` when nothing is left.
    pub fn clip(&self, start: TimeOfDay, end: TimeOfDay) -> Option<(TimeOfDay, TimeOfDay)> {
        let start = start.max(self.open);
        let end = end.min(self.close);
        (start < end).then_some((start, end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingHours {
    pub default: OperatingWindow,
    pub weekdays: HashMap<Weekday, OperatingWindow>,
}

impl OperatingHours {
    pub fn uniform(window: OperatingWindow) -> Self {
        Self {
            default: window,
            weekdays: HashMap::new(),
        }
    }

    pub fn window_for(&self, date: NaiveDate) -> OperatingWindow {
        self.weekdays
            .get(&date.weekday())
            .copied()
            .unwrap_or(self.default)
    }
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub timezone: Tz,
    pub hours: OperatingHours,
    pub courts: Vec<CourtConfig>,
    pub target_phrase: String,
    pub output_path: PathBuf,
    pub min_slot_minutes: u32,
    pub retry: RetryPolicy,
    pub fetch_timeout_secs: u64,
}

impl AppConfig {
    /// Load, apply env overrides, and validate.
    ///
    /// The path is taken from `path`, then `COURT_GAPS_CONFIG`, then the
    /// default search locations.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut file = match path {
            Some(p) => ConfigFile::from_file(p)?,
            None => match env::var(CONFIG_ENV) {
                Ok(p) if !p.trim().is_empty() => ConfigFile::from_file(p.trim())?,
                _ => ConfigFile::from_default_location()?,
            },
        };
        file.apply_env_overrides();
        file.validate()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        ConfigFile::from_toml_str(content)?.validate()
    }

    /// Configuration with defaults for everything but the court list.
    pub fn with_courts<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfigFile {
            timezone: default_timezone(),
            horizon_days: default_horizon_days(),
            hours: HoursSettings::default(),
            courts: names
                .into_iter()
                .map(|name| CourtSettings {
                    name: name.into(),
                    ical_url: None,
                    ical_path: None,
                })
                .collect(),
            classifier: ClassifierSettings::default(),
            report: ReportSettings::default(),
            fetch: FetchSettings::default(),
        }
        .validate()
    }

    pub fn court_set(&self) -> CourtSet {
        self.courts.iter().map(|c| c.court.clone()).collect()
    }
}

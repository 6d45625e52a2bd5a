//! iCal feed source.
//!
//! Each configured court has its own feed. Feeds are fetched one after the
//! other under the configured [`RetryPolicy`]; a court whose feed cannot be
//! fetched is reported as unavailable instead of failing the run.
//!
//! Documents are read with the `ical` crate; on top of its components this
//! module interprets `SUMMARY`/`LOCATION`, `DTSTART`/`DTEND`/`DURATION`,
//! UTC, `TZID` and floating date-times, and all-day `VALUE=DATE` values.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use ::ical::parser::ical::component::IcalEvent as VEvent;
use ::ical::property::Property;
use ::ical::IcalParser;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, FeedLocation};
use crate::error::SourceError;
use crate::models::{Court, RawEntry, RawTime};
use crate::services::horizon::Horizon;

use super::retry::RetryPolicy;
use super::{RawEntrySource, SourceHealth, SourceOutcome, Unavailable};

/// A `DTSTART`/`DTEND` value after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcalTime {
    Timed(RawTime),
    AllDay(NaiveDate),
}

/// One `VEVENT`, with only the properties the engine needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcalEvent {
    pub summary: Option<String>,
    pub location: Option<String>,
    pub start: Option<IcalTime>,
    pub end: Option<IcalTime>,
    pub duration: Option<Duration>,
}

impl IcalEvent {
    /// Convert to a raw entry for `court`.
    ///
    /// All-day events become floating midnight-to-midnight ranges. A missing
    /// end is derived from `DURATION`, or one day for all-day events.
    pub fn into_raw_entry(self, court: &Court) -> RawEntry {
        let start = self.start.map(to_raw_time);
        let end = match (self.end, self.start, self.duration) {
            (Some(end), _, _) => Some(to_raw_time(end)),
            (None, Some(start), Some(duration)) => add_duration(to_raw_time(start), duration),
            (None, Some(IcalTime::AllDay(date)), None) => date
                .succ_opt()
                .map(|next| RawTime::Floating(next.and_time(chrono::NaiveTime::MIN))),
            _ => None,
        };
        RawEntry {
            title: self.summary,
            court: Some(court.to_string()),
            date: None,
            start,
            end,
        }
    }
}

fn to_raw_time(time: IcalTime) -> RawTime {
    match time {
        IcalTime::Timed(raw) => raw,
        IcalTime::AllDay(date) => RawTime::Floating(date.and_time(chrono::NaiveTime::MIN)),
    }
}

fn add_duration(start: RawTime, duration: Duration) -> Option<RawTime> {
    match start {
        RawTime::Zoned(dt) => dt.checked_add_signed(duration).map(RawTime::Zoned),
        RawTime::Floating(dt) => dt.checked_add_signed(duration).map(RawTime::Floating),
        RawTime::WallClock(_) => None,
    }
}

/// Value of the first `key` parameter on `prop`.
fn param<'a>(prop: &'a Property, key: &str) -> Option<&'a str> {
    prop.params
        .as_ref()?
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .and_then(|(_, values)| values.first())
        .map(|v| v.trim().trim_matches('"'))
}

/// TEXT value with the common escapes (`\,` `\;` `\n` `\\`) undone.
fn text_value(prop: &Property) -> Option<String> {
    let value = prop.value.as_deref()?;
    let text = value
        .replace("\\n", "\n")
        .replace("\\N", "\n")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\");
    Some(text.trim().to_string())
}

/// Parse a `DTSTART`/`DTEND` property value. `None` when unparseable.
fn parse_date_time(prop: &Property) -> Option<IcalTime> {
    let value = prop.value.as_deref()?.trim();
    if param(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE")) || value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(IcalTime::AllDay);
    }

    if let Some(utc) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        let zoned = Utc.from_utc_datetime(&naive).fixed_offset();
        return Some(IcalTime::Timed(RawTime::Zoned(zoned)));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    match param(prop, "TZID") {
        Some(tzid) => match tzid.parse::<Tz>() {
            Ok(tz) => {
                // A nonexistent local time (DST gap) cannot be placed; leave it unparsed.
                let local = tz.from_local_datetime(&naive).earliest()?;
                let offset = local.offset().fix();
                Some(IcalTime::Timed(RawTime::Zoned(local.with_timezone(&offset))))
            }
            Err(_) => {
                debug!("Unknown TZID '{}', treating time as floating", tzid);
                Some(IcalTime::Timed(RawTime::Floating(naive)))
            }
        },
        None => Some(IcalTime::Timed(RawTime::Floating(naive))),
    }
}

/// Parse an RFC 5545 duration such as `PT1H30M`, `P1D` or `P2W`.
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let rest = rest.strip_prefix('P')?;
    let mut total = Duration::zero();
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;
    for ch in rest.chars() {
        match ch {
            '0'..='9' => number.push(ch),
            'T' => in_time = true,
            unit => {
                let n: i64 = number.parse().ok()?;
                number.clear();
                saw_component = true;
                total += match (unit, in_time) {
                    ('W', false) => Duration::weeks(n),
                    ('D', false) => Duration::days(n),
                    ('H', true) => Duration::hours(n),
                    ('M', true) => Duration::minutes(n),
                    ('S', true) => Duration::seconds(n),
                    _ => return None,
                };
            }
        }
    }
    if !number.is_empty() || !saw_component {
        return None;
    }
    Some(if negative { -total } else { total })
}

fn event_from_component(component: &VEvent) -> IcalEvent {
    let mut event = IcalEvent::default();
    // Alarms live in `component.alarms`, so their DTSTART never lands here.
    for prop in &component.properties {
        match prop.name.to_ascii_uppercase().as_str() {
            "SUMMARY" => event.summary = text_value(prop),
            "LOCATION" => event.location = text_value(prop),
            "DTSTART" => event.start = parse_date_time(prop),
            "DTEND" => event.end = parse_date_time(prop),
            "DURATION" => event.duration = prop.value.as_deref().and_then(parse_duration),
            _ => {}
        }
    }
    event
}

/// Parse every `VEVENT` in an iCal document.
///
/// Unparseable property values are left empty for the normalizer to count;
/// a document the parser cannot read at all is an error.
pub fn parse_ical(text: &str) -> Result<Vec<IcalEvent>, SourceError> {
    let mut events = Vec::new();
    for calendar in IcalParser::new(text.as_bytes()) {
        let calendar =
            calendar.map_err(|e| SourceError::InvalidData(format!("iCal parse error: {}", e)))?;
        events.extend(calendar.events.iter().map(event_from_component));
    }
    Ok(events)
}

/// Retrieves the raw text of a feed.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch_text(&self, location: &FeedLocation) -> Result<String, SourceError>;
}

/// Reads `ical_path` feeds from disk and `ical_url` feeds over HTTP.
pub struct DefaultFetcher {
    #[cfg(feature = "http-fetch")]
    client: reqwest::Client,
}

impl DefaultFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, SourceError> {
        #[cfg(feature = "http-fetch")]
        {
            let client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .map_err(|e| SourceError::InvalidData(format!("HTTP client setup failed: {}", e)))?;
            Ok(Self { client })
        }
        #[cfg(not(feature = "http-fetch"))]
        {
            let _ = timeout_secs;
            Ok(Self {})
        }
    }
}

#[async_trait]
impl FeedFetcher for DefaultFetcher {
    async fn fetch_text(&self, location: &FeedLocation) -> Result<String, SourceError> {
        match location {
            FeedLocation::Path(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.clone(),
                        source,
                    })
            }
            #[cfg(feature = "http-fetch")]
            FeedLocation::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| SourceError::Request(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status(status.as_u16()));
                }
                response
                    .text()
                    .await
                    .map_err(|e| SourceError::Request(e.to_string()))
            }
            #[cfg(not(feature = "http-fetch"))]
            FeedLocation::Url(url) => Err(SourceError::InvalidData(format!(
                "cannot fetch {}: built without the http-fetch feature",
                url
            ))),
        }
    }
}

/// Source reading one iCal feed per court.
pub struct IcalFeedSource {
    feeds: Vec<(Court, Option<FeedLocation>)>,
    retry: RetryPolicy,
    fetcher: Arc<dyn FeedFetcher>,
}

impl IcalFeedSource {
    pub fn new(
        feeds: Vec<(Court, Option<FeedLocation>)>,
        retry: RetryPolicy,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self {
            feeds,
            retry,
            fetcher,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        let feeds = config
            .courts
            .iter()
            .map(|c| (c.court.clone(), c.feed.clone()))
            .collect();
        let fetcher = DefaultFetcher::new(config.fetch_timeout_secs)?;
        Ok(Self::new(feeds, config.retry, Arc::new(fetcher)))
    }
}

#[async_trait]
impl RawEntrySource for IcalFeedSource {
    fn name(&self) -> &str {
        "ical"
    }

    async fn fetch(&self, horizon: &Horizon) -> SourceOutcome {
        let mut entries = Vec::new();
        let mut unavailable = Vec::new();
        let mut max_attempts = 0;

        for (court, feed) in &self.feeds {
            let Some(location) = feed else {
                warn!("No iCal feed configured for {}", court);
                unavailable.push(Unavailable::court(
                    court.clone(),
                    SourceError::NoFeed(court.to_string()).to_string(),
                ));
                continue;
            };

            let label = format!("iCal feed for {}", court);
            let (result, attempts) = self
                .retry
                .run(&label, || self.fetcher.fetch_text(location))
                .await;
            max_attempts = max_attempts.max(attempts);

            match result.and_then(|text| parse_ical(&text)) {
                Ok(events) => {
                    info!(
                        "Fetched {} event(s) for {} ({} to {})",
                        events.len(),
                        court,
                        horizon.start(),
                        horizon.end()
                    );
                    entries.extend(events.into_iter().map(|e| e.into_raw_entry(court)));
                }
                Err(err) => {
                    warn!("{} unavailable after {} attempt(s): {}", label, attempts, err);
                    unavailable.push(Unavailable::court(court.clone(), err.to_string()));
                }
            }
        }

        let courts: Vec<Court> = self.feeds.iter().map(|(c, _)| c.clone()).collect();
        SourceOutcome {
            entries,
            health: SourceHealth::from_unavailable(unavailable, &courts, max_attempts.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Timelike};

    fn calendar(body: &str) -> String {
        format!("BEGIN:VCALENDAR\nVERSION:2.0\n{}END:VCALENDAR\n", body)
    }

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//CollegeNET//25Live//EN\r\n\
BEGIN:VEVENT\r\n\
UID:1@example\r\n\
SUMMARY:Badminton Club Open Play\\, Gym A\r\n\
DTSTART:20240110T230000Z\r\n\
DTEND:20240111T010000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Volleyball Practice for the intra\r\n\
\x20mural league\r\n\
DTSTART;TZID=America/New_York:20240110T090000\r\n\
DURATION:PT1H30M\r\n\
BEGIN:VALARM\r\n\
DESCRIPTION:reminder\r\n\
DTSTART:19700101T000000\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Facility Closed\r\n\
DTSTART;VALUE=DATE:20240112\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn test_parse_events() {
        let events = parse_ical(FEED).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0].summary.as_deref(),
            Some("Badminton Club Open Play, Gym A")
        );
        assert_eq!(
            events[1].summary.as_deref(),
            Some("Volleyball Practice for the intramural league")
        );
        assert_eq!(events[1].duration, Some(Duration::minutes(90)));
        assert_eq!(
            events[2].start,
            Some(IcalTime::AllDay(NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()))
        );
    }

    #[test]
    fn test_valarm_does_not_override_event_start() {
        let events = parse_ical(FEED).unwrap();
        match events[1].start {
            Some(IcalTime::Timed(RawTime::Zoned(dt))) => {
                assert_eq!(dt.hour(), 9);
                assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
            }
            other => panic!("unexpected start {:?}", other),
        }
    }

    #[test]
    fn test_duration_derives_end() {
        let court = Court::new("Court 1");
        let entry = parse_ical(FEED).unwrap().remove(1).into_raw_entry(&court);
        match (entry.start, entry.end) {
            (Some(RawTime::Zoned(s)), Some(RawTime::Zoned(e))) => {
                assert_eq!((e - s).num_minutes(), 90)
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(entry.court.as_deref(), Some("Court 1"));
    }

    #[test]
    fn test_all_day_event_spans_whole_day() {
        let court = Court::new("Court 1");
        let entry = parse_ical(FEED).unwrap().remove(2).into_raw_entry(&court);
        let day = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
        assert_eq!(
            entry.start,
            Some(RawTime::Floating(day.and_time(NaiveTime::MIN)))
        );
        assert_eq!(
            entry.end,
            Some(RawTime::Floating(day.succ_opt().unwrap().and_time(NaiveTime::MIN)))
        );
    }

    #[test]
    fn test_unparseable_time_left_empty() {
        let events = parse_ical(&calendar(
            "BEGIN:VEVENT\nSUMMARY:Broken\nDTSTART:tomorrow\nDTEND:20240110T100000\nEND:VEVENT\n",
        ))
        .unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].start.is_none());
        assert!(events[0].end.is_some());
    }

    #[test]
    fn test_unknown_tzid_is_floating() {
        let events = parse_ical(&calendar(
            "BEGIN:VEVENT\nDTSTART;TZID=\"Eastern Standard Time\":20240110T100000\nEND:VEVENT\n",
        ))
        .unwrap();
        assert!(matches!(
            events[0].start,
            Some(IcalTime::Timed(RawTime::Floating(_)))
        ));
    }

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration("PT1H"), Some(Duration::hours(1)));
        assert_eq!(parse_duration("P1D"), Some(Duration::days(1)));
        assert_eq!(parse_duration("P1DT2H"), Some(Duration::hours(26)));
        assert_eq!(parse_duration("P2W"), Some(Duration::weeks(2)));
        assert_eq!(parse_duration("-PT15M"), Some(Duration::minutes(-15)));
        assert_eq!(parse_duration("PT"), None);
        assert_eq!(parse_duration("1H"), None);
        assert_eq!(parse_duration("PT5"), None);
    }

    #[test]
    fn test_escaped_text_is_plain() {
        let events = parse_ical(&calendar(
            "BEGIN:VEVENT\nSUMMARY:Open Play\\; Gym A\\, Court 2\nLOCATION:Rec\\nCenter\nEND:VEVENT\n",
        ))
        .unwrap();
        assert_eq!(events[0].summary.as_deref(), Some("Open Play; Gym A, Court 2"));
        assert_eq!(events[0].location.as_deref(), Some("Rec\nCenter"));
    }

    #[test]
    fn test_unreadable_document_is_error() {
        let err = parse_ical("BEGIN:VCALENDAR\nBEGIN:VEVENT\nSUMMARY:cut off\n").unwrap_err();
        assert!(matches!(err, SourceError::InvalidData(_)));
    }
}

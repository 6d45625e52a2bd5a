//! Human-readable console summary of a report.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{BadmintonSession, TimeOfDay};
use crate::services::Report;

const RULE: &str = "============================================================";

fn day_label(date: NaiveDate) -> String {
    date.format("%a %b %-d %Y").to_string()
}

fn span(start: TimeOfDay, end: TimeOfDay) -> String {
    format!("{} - {}", start.to_12h(), end.to_12h())
}

fn render_sessions(out: &mut String, sessions: &[BadmintonSession]) {
    if sessions.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}\n  BADMINTON OPEN PLAY TIMES\n{}", RULE, RULE);

    let mut by_date: BTreeMap<NaiveDate, Vec<&BadmintonSession>> = BTreeMap::new();
    for session in sessions {
        by_date.entry(session.date).or_default().push(session);
    }
    for (date, sessions) in by_date {
        let _ = writeln!(out, "\n  {}:", day_label(date));
        for s in sessions {
            let court = s.court.as_ref().map(|c| format!(", {}", c)).unwrap_or_default();
            let _ = writeln!(out, "    {} ({}{})", span(s.start, s.end), s.title, court);
        }
    }
}

/// Per court: slots per day, "Fully booked" days, unknown days and a total;
/// then the open-play sessions grouped by date.
pub fn render_summary(report: &Report) -> String {
    let mut out = String::new();

    for (court, days) in &report.courts {
        let _ = writeln!(out, "\n{}\n  AVAILABLE SLOTS: {}\n{}", RULE, court, RULE);
        let mut total = 0;
        for day in days {
            let label = day_label(day.date);
            if day.is_unknown() {
                let _ = writeln!(out, "\n  {}: (unknown)", label);
                continue;
            }
            if day.slots.is_empty() {
                let _ = writeln!(out, "\n  {}: Fully booked", label);
                continue;
            }
            let _ = writeln!(out, "\n  {}:", label);
            for slot in &day.slots {
                let note = slot
                    .note
                    .as_ref()
                    .map(|n| format!(" [{}]", n))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "    {} ({:.1} hrs){}",
                    span(slot.start, slot.end),
                    slot.duration_hours,
                    note
                );
                total += 1;
            }
        }
        let _ = writeln!(out, "\n  Total available slots: {}", total);
    }

    render_sessions(&mut out, &report.badminton_open_play);
    out
}

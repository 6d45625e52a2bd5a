//! Recognition of the open-play sessions among accepted entries.
//!
//! Titles and the target phrase are folded the same way before a substring
//! test: lowercase, every non-alphanumeric character becomes a space, and
//! runs of whitespace collapse. "BADMINTON club - open   play!" therefore
//! matches "Badminton Club Open Play".

use std::collections::BTreeSet;

use tracing::debug;

use crate::models::BadmintonSession;

use super::normalizer::AcceptedEntry;

/// Longest title snippet carried into the report.
pub const MAX_TITLE_CHARS: usize = 80;

fn fold(text: &str) -> String {
    let mapped: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn snippet(title: &str) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_TITLE_CHARS).collect()
}

pub struct EventClassifier {
    folded_phrase: String,
}

impl EventClassifier {
    pub fn new(target_phrase: &str) -> Self {
        Self {
            folded_phrase: fold(target_phrase),
        }
    }

    pub fn matches(&self, title: &str) -> bool {
        !self.folded_phrase.is_empty() && fold(title).contains(&self.folded_phrase)
    }

    /// Matching sessions, one per (date, start, end, court), sorted by that key.
    pub fn classify(&self, entries: &[AcceptedEntry]) -> Vec<BadmintonSession> {
        let mut seen = BTreeSet::new();
        let mut sessions = Vec::new();

        for entry in entries {
            let Some(title) = entry.title.as_deref() else {
                continue;
            };
            if !self.matches(title) {
                continue;
            }
            let piece = entry.first_piece();
            let key = (piece.date, piece.start, piece.end, entry.court.clone());
            if !seen.insert(key) {
                debug!("Duplicate session '{}' on {} {}", title, entry.court, piece.date);
                continue;
            }
            sessions.push(BadmintonSession {
                date: piece.date,
                start: piece.start,
                end: piece.end,
                title: snippet(title),
                court: Some(entry.court.clone()),
            });
        }

        sessions.sort_by(|a, b| {
            (a.date, a.start, a.end, &a.court).cmp(&(b.date, b.start, b.end, &b.court))
        });
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusyInterval, Court, TimeOfDay};
    use chrono::NaiveDate;

    fn entry(title: &str, court: &str, day: u32, start: u16, end: u16) -> AcceptedEntry {
        let court = Court::new(court);
        let piece = BusyInterval::new(
            court.clone(),
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            TimeOfDay::from_hm(start, 0).unwrap(),
            TimeOfDay::from_hm(end, 0).unwrap(),
        )
        .unwrap();
        AcceptedEntry {
            title: Some(title.to_string()),
            court,
            pieces: vec![piece],
        }
    }

    #[test]
    fn test_matching_is_tolerant() {
        let classifier = EventClassifier::new("Badminton Club Open Play");
        assert!(classifier.matches("Badminton Club Open Play"));
        assert!(classifier.matches("BADMINTON club - open   play!"));
        assert!(classifier.matches("UMD Badminton-Club Open Play (Gym 2)"));
        assert!(!classifier.matches("Badminton Club Meeting"));
        assert!(!classifier.matches("Open Play"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let classifier = EventClassifier::new("Badminton Club Open Play");
        let sessions = classifier.classify(&[
            entry("Badminton Club Open Play", "Court 2", 11, 18, 20),
            entry("badminton club open play", "Court 2", 11, 18, 20),
            entry("Badminton Club Open Play", "Court 3", 11, 18, 20),
            entry("Badminton Club Open Play", "Court 1", 10, 18, 20),
            entry("Volleyball", "Court 1", 10, 9, 10),
        ]);
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].court, Some(Court::new("Court 1")));
        assert_eq!(sessions[1].court, Some(Court::new("Court 2")));
        assert_eq!(sessions[2].court, Some(Court::new("Court 3")));
    }

    #[test]
    fn test_snippet_is_bounded() {
        let long = format!("Badminton Club Open Play   {}", "x".repeat(200));
        let classifier = EventClassifier::new("Badminton Club Open Play");
        let sessions = classifier.classify(&[entry(&long, "Court 1", 10, 18, 20)]);
        assert_eq!(sessions[0].title.chars().count(), MAX_TITLE_CHARS);
        assert!(sessions[0].title.starts_with("Badminton Club Open Play x"));
    }
}

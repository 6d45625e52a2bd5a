//! Free-slot computation for one court and one day.
//!
//! Busy intervals are clipped to the operating window, sorted, merged when
//! they overlap or touch, and the uncovered remainder of the window becomes
//! the list of free slots. The merged busy list and the free list together
//! partition the window exactly; [`DayAvailability::verify_partition`]
//! checks that directly.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::{OperatingHours, OperatingWindow};
use crate::models::{BusyInterval, Court, FreeSlot, TimeOfDay};

use super::normalizer::NormalizedEntries;

/// Merged busy time and free time for one (court, date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub court: Court,
    pub date: NaiveDate,
    pub window: OperatingWindow,
    /// Sorted, disjoint, non-touching, inside the window.
    pub busy: Vec<BusyInterval>,
    /// Sorted, disjoint, inside the window.
    pub free: Vec<FreeSlot>,
}

impl DayAvailability {
    pub fn is_fully_booked(&self) -> bool {
        self.free.is_empty()
    }

    pub fn free_minutes(&self) -> i32 {
        self.free.iter().map(FreeSlot::duration_minutes).sum()
    }

    /// Whether busy and free ranges tile `[open, close)` with no gap or overlap.
    pub fn verify_partition(&self) -> bool {
        let mut pieces: Vec<(TimeOfDay, TimeOfDay, bool)> = self
            .busy
            .iter()
            .map(|b| (b.start, b.end, true))
            .chain(self.free.iter().map(|f| (f.start, f.end, false)))
            .collect();
        pieces.sort();

        let mut cursor = self.window.open;
        let mut previous_busy: Option<bool> = None;
        for (start, end, busy) in pieces {
            if start != cursor || start >= end {
                return false;
            }
            // Maximal ranges never sit next to one of their own kind.
            if previous_busy == Some(busy) {
                return false;
            }
            previous_busy = Some(busy);
            cursor = end;
        }
        cursor == self.window.close
    }
}

/// Clip to the window, sort by (start, end), and merge overlapping or
/// touching intervals.
pub fn merge_busy(intervals: &[BusyInterval], window: OperatingWindow) -> Vec<BusyInterval> {
    let mut clipped: Vec<BusyInterval> = intervals
        .iter()
        .filter_map(|interval| {
            let (start, end) = window.clip(interval.start, interval.end)?;
            Some(BusyInterval {
                start,
                end,
                ..interval.clone()
            })
        })
        .collect();

    clipped.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(clipped.len());
    for interval in clipped {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                if interval.end > last.end {
                    last.end = interval.end;
                }
                continue;
            }
        }
        merged.push(interval);
    }
    merged
}

/// Free slots left in `window` by already merged busy intervals.
pub fn free_slots(
    court: &Court,
    date: NaiveDate,
    window: OperatingWindow,
    merged: &[BusyInterval],
) -> Vec<FreeSlot> {
    let mut slots = Vec::new();
    let mut cursor = window.open;
    for busy in merged {
        if busy.start > cursor {
            slots.push(FreeSlot {
                court: court.clone(),
                date,
                start: cursor,
                end: busy.start,
            });
        }
        cursor = cursor.max(busy.end);
    }
    if cursor < window.close {
        slots.push(FreeSlot {
            court: court.clone(),
            date,
            start: cursor,
            end: window.close,
        });
    }
    slots.retain(|slot| slot.duration_minutes() > 0);
    slots
}

pub fn compute_day(
    court: &Court,
    date: NaiveDate,
    window: OperatingWindow,
    busy: &[BusyInterval],
) -> DayAvailability {
    let merged = merge_busy(busy, window);
    let free = free_slots(court, date, window, &merged);
    DayAvailability {
        court: court.clone(),
        date,
        window,
        busy: merged,
        free,
    }
}

/// Availability for every (court, date) in the normalized batch.
pub fn compute_all(
    normalized: &NormalizedEntries,
    hours: &OperatingHours,
) -> BTreeMap<(Court, NaiveDate), DayAvailability> {
    normalized
        .busy
        .iter()
        .map(|((court, date), busy)| {
            let window = hours.window_for(*date);
            ((court.clone(), *date), compute_day(court, *date, window, busy))
        })
        .collect()
}

//! Property tests for the gap calculator.
//!
//! For arbitrary busy intervals and operating windows, the free slots must
//! be sorted, disjoint, never overlap busy time, and together with the
//! merged busy intervals tile the window exactly.

use chrono::NaiveDate;
use proptest::prelude::*;

use court_gaps::config::OperatingWindow;
use court_gaps::models::{BusyInterval, Court, TimeOfDay, MINUTES_PER_DAY};
use court_gaps::services::gaps::{compute_day, merge_busy};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

fn interval_strategy() -> impl Strategy<Value = BusyInterval> {
    (0u16..MINUTES_PER_DAY, 1u16..=600).prop_map(|(start, len)| {
        let end = (start + len).min(MINUTES_PER_DAY);
        BusyInterval::new(
            Court::new("Court 1"),
            day(),
            TimeOfDay::from_minutes(start).unwrap(),
            TimeOfDay::from_minutes(end).unwrap(),
        )
        .unwrap()
    })
}

fn window_strategy() -> impl Strategy<Value = OperatingWindow> {
    (0u16..MINUTES_PER_DAY)
        .prop_flat_map(|open| (Just(open), open + 1..=MINUTES_PER_DAY))
        .prop_map(|(open, close)| {
            OperatingWindow::new(
                TimeOfDay::from_minutes(open).unwrap(),
                TimeOfDay::from_minutes(close).unwrap(),
            )
            .unwrap()
        })
}

proptest! {
    #[test]
    fn prop_free_and_busy_partition_window(
        busy in prop::collection::vec(interval_strategy(), 0..25),
        window in window_strategy(),
    ) {
        let result = compute_day(&Court::new("Court 1"), day(), window, &busy);
        prop_assert!(result.verify_partition());

        let free: i32 = result.free.iter().map(|s| s.duration_minutes()).sum();
        let taken: i32 = result.busy.iter().map(|b| b.duration_minutes()).sum();
        prop_assert_eq!(free + taken, window.duration_minutes());
    }

    #[test]
    fn prop_free_slots_sorted_disjoint_and_inside_window(
        busy in prop::collection::vec(interval_strategy(), 0..25),
        window in window_strategy(),
    ) {
        let result = compute_day(&Court::new("Court 1"), day(), window, &busy);
        for slot in &result.free {
            prop_assert!(slot.start < slot.end);
            prop_assert!(slot.start >= window.open && slot.end <= window.close);
        }
        for pair in result.free.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
    }

    #[test]
    fn prop_free_slots_never_overlap_input(
        busy in prop::collection::vec(interval_strategy(), 0..25),
        window in window_strategy(),
    ) {
        let result = compute_day(&Court::new("Court 1"), day(), window, &busy);
        for slot in &result.free {
            for b in &busy {
                prop_assert!(slot.end <= b.start || slot.start >= b.end);
            }
        }
    }

    #[test]
    fn prop_input_order_does_not_matter(
        busy in prop::collection::vec(interval_strategy(), 0..25),
        window in window_strategy(),
    ) {
        let mut reversed = busy.clone();
        reversed.reverse();
        let a = compute_day(&Court::new("Court 1"), day(), window, &busy);
        let b = compute_day(&Court::new("Court 1"), day(), window, &reversed);
        prop_assert_eq!(a.free, b.free);
        prop_assert_eq!(a.busy, b.busy);
    }

    #[test]
    fn prop_merging_is_idempotent(
        busy in prop::collection::vec(interval_strategy(), 0..25),
        window in window_strategy(),
    ) {
        let once = merge_busy(&busy, window);
        let twice = merge_busy(&once, window);
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn test_merge_correctness_example() {
    // [09:00,10:00) + [09:30,11:00) + [11:00,11:15) -> one [09:00,11:15)
    let window = OperatingWindow::new(
        TimeOfDay::from_hm(6, 0).unwrap(),
        TimeOfDay::from_hm(23, 0).unwrap(),
    )
    .unwrap();
    let make = |s: (u16, u16), e: (u16, u16)| {
        BusyInterval::new(
            Court::new("Court 1"),
            day(),
            TimeOfDay::from_hm(s.0, s.1).unwrap(),
            TimeOfDay::from_hm(e.0, e.1).unwrap(),
        )
        .unwrap()
    };
    let result = compute_day(
        &Court::new("Court 1"),
        day(),
        window,
        &[make((9, 0), (10, 0)), make((9, 30), (11, 0)), make((11, 0), (11, 15))],
    );
    assert_eq!(result.busy.len(), 1);
    assert_eq!(result.busy[0].end.to_string(), "11:15");
    let free: Vec<String> = result
        .free
        .iter()
        .map(|s| format!("{}-{}", s.start, s.end))
        .collect();
    assert_eq!(free, vec!["06:00-09:00", "11:15-23:00"]);
}

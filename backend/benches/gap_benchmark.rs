use std::hint::black_box;

use chrono::{NaiveDate, NaiveTime};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use court_gaps::config::AppConfig;
use court_gaps::config::OperatingWindow;
use court_gaps::models::{BusyInterval, Court, RawEntry, TimeOfDay};
use court_gaps::services::gaps::compute_day;
use court_gaps::services::{Horizon, Normalizer};
use court_gaps::sources::ical::parse_ical;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

fn busy_intervals(count: u16) -> Vec<BusyInterval> {
    (0..count)
        .filter_map(|i| {
            let start = (i * 37) % 1380;
            BusyInterval::new(
                Court::new("Court 1"),
                day(),
                TimeOfDay::from_minutes(start)?,
                TimeOfDay::from_minutes(start + 45)?,
            )
        })
        .collect()
}

fn bench_compute_day(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_day");
    let window = OperatingWindow::new(
        TimeOfDay::from_hm(6, 0).unwrap(),
        TimeOfDay::from_hm(23, 0).unwrap(),
    )
    .unwrap();
    let court = Court::new("Court 1");

    for count in [10u16, 100, 1000] {
        let busy = busy_intervals(count);
        group.bench_with_input(BenchmarkId::new("intervals", count), &busy, |b, busy| {
            b.iter(|| compute_day(&court, day(), window, black_box(busy)));
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let config = AppConfig::with_courts(["Court 1", "Court 2", "Court 3"]).unwrap();
    let courts = config.court_set();
    let horizon = Horizon::starting(day());

    let entries: Vec<RawEntry> = (0..700u32)
        .map(|i| {
            let date = day() + chrono::Duration::days((i % 7) as i64);
            let hour = 6 + (i % 16);
            RawEntry::wall_clock(
                format!("Booking {}", i),
                format!("Court {}", 1 + i % 3),
                date,
                NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            )
        })
        .collect();

    group.bench_function("700_entries", |b| {
        b.iter(|| {
            Normalizer::new(config.timezone, &courts, horizon).normalize(black_box(entries.clone()))
        });
    });

    group.finish();
}

fn bench_parse_ical(c: &mut Criterion) {
    let mut group = c.benchmark_group("ical_parsing");
    let mut feed = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
    for i in 0..200 {
        feed.push_str(&format!(
            "BEGIN:VEVENT\r\nSUMMARY:Event {}\r\nDTSTART;TZID=America/New_York:202401{:02}T{:02}0000\r\nDURATION:PT1H\r\nEND:VEVENT\r\n",
            i,
            10 + i % 7,
            6 + i % 16
        ));
    }
    feed.push_str("END:VCALENDAR\r\n");

    group.bench_function("200_events", |b| {
        b.iter(|| parse_ical(black_box(&feed)));
    });

    group.finish();
}

criterion_group!(benches, bench_compute_day, bench_normalize, bench_parse_ical);
criterion_main!(benches);

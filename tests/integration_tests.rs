//! Integration tests for trading activity analysis
//!
//! Runs the full fetch, window, join, test and plot pipeline against
//! fixture sources.

use chrono::NaiveDate;
use std::io::Write;
use trading_activity::{
    AnalysisConfig, AnalysisError, CsvVolumeSource, DataLoader, Event, EventWindowBuilder,
    InMemoryCalendar, InMemoryVolumes, NormalityMethod, TradingActivityAnalyzer, TradingCalendar,
    VolumeObservation,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// NYSE holidays observed in 2021
fn holidays_2021() -> Vec<NaiveDate> {
    vec![
        day(2021, 1, 1),
        day(2021, 1, 18),
        day(2021, 2, 15),
        day(2021, 4, 2),
        day(2021, 5, 31),
        day(2021, 7, 5),
        day(2021, 9, 6),
        day(2021, 11, 25),
        day(2021, 12, 24),
    ]
}

fn calendar_2021() -> TradingCalendar {
    TradingCalendar::weekdays(day(2021, 1, 1), day(2021, 12, 31), &holidays_2021()).unwrap()
}

/// Deterministic daily volume for every trading day and security
fn synthetic_volumes(calendar: &TradingCalendar, securities: &[u64]) -> Vec<VolumeObservation> {
    let mut observations = Vec::new();
    for &security in securities {
        for (i, date) in calendar.days().iter().enumerate() {
            let volume = 1000.0 * (1.0 + (i as f64 * 0.2 + security as f64).sin().abs());
            observations.push(VolumeObservation::new(security, *date, volume));
        }
    }
    observations
}

fn config(dir: &std::path::Path) -> AnalysisConfig {
    AnalysisConfig {
        period_start: -5,
        period_end: 6,
        year_start: 2021,
        year_end: 2021,
        output_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn test_reference_event_window() {
    let calendar = calendar_2021();
    let builder = EventWindowBuilder::new(&calendar, -5, 6).unwrap();
    let window = builder.build(&Event::new(day(2021, 6, 15), 14593)).unwrap();

    assert_eq!(window.len(), 11);
    let positions: Vec<i32> = window.entries.iter().map(|e| e.relative_position).collect();
    assert_eq!(positions, (-5..=5).collect::<Vec<_>>());

    let anchor = window
        .entries
        .iter()
        .find(|e| e.relative_position == 0)
        .unwrap();
    assert_eq!(anchor.date, day(2021, 6, 15));
    assert_eq!(window.entries[0].date, day(2021, 6, 8));
    assert_eq!(window.entries[10].date, day(2021, 6, 22));
}

#[test]
fn test_window_skips_holidays() {
    let calendar = calendar_2021();
    let builder = EventWindowBuilder::new(&calendar, -1, 2).unwrap();

    // Independence Day observed on Monday 2021-07-05
    let window = builder.build(&Event::new(day(2021, 7, 5), 1)).unwrap();
    assert_eq!(window.anchor, day(2021, 7, 6));
    let dates: Vec<NaiveDate> = window.entries.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![day(2021, 7, 2), day(2021, 7, 6), day(2021, 7, 7)]);
}

#[test]
fn test_full_pipeline_all_methods() {
    let dir = tempfile::tempdir().unwrap();
    let calendar = calendar_2021();

    let mut observations = synthetic_volumes(&calendar, &[14593, 10107]);
    // Leave 10107 with a single observation in its window to force a skip
    observations.retain(|o| {
        !(o.security_id == 10107 && o.date >= day(2021, 3, 1) && o.date <= day(2021, 3, 12))
    });

    let calendar_source = InMemoryCalendar::new(calendar.days().to_vec());
    let volume_source = InMemoryVolumes::new(observations);
    let analyzer =
        TradingActivityAnalyzer::new(config(dir.path()), &calendar_source, &volume_source).unwrap();

    let events = vec![
        Event::new(day(2021, 6, 15), 14593),
        Event::new(day(2021, 3, 5), 10107),
        Event::new(day(2022, 1, 10), 11869),
        Event::new(day(2021, 6, 15), 14593),
    ];

    let data = analyzer.fetch_trading_data(&events).unwrap();
    assert_eq!(data.activities.len(), 2);
    assert_eq!(data.failures.len(), 1);
    assert_eq!(data.failures[0].event.security_id, 11869);
    assert!(matches!(
        data.failures[0].error,
        AnalysisError::OutsideCalendar { .. }
    ));

    // Sorted by event key: 2021-03-05 before 2021-06-15
    assert_eq!(data.activities[0].event.security_id, 10107);
    assert_eq!(data.activities[0].volumes().len(), 1);
    assert_eq!(data.activities[0].rows.len(), 11);
    assert_eq!(data.activities[1].volumes().len(), 11);

    for method in NormalityMethod::ALL {
        let run = analyzer.test_activity_normality(&data, method).unwrap();
        assert_eq!(run.report.results.len(), 1);
        assert_eq!(run.report.skipped, vec![Event::new(day(2021, 3, 5), 10107)]);

        let expected = dir.path().join(format!("trading_activity_{}.csv", method.name()));
        assert_eq!(run.path, expected);

        let content = std::fs::read_to_string(&expected).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(',').count(), method.csv_header().len());
        assert!(lines[1].starts_with("2021-06-15,14593,"));
    }
}

#[test]
fn test_check_trading_activity_with_plots() {
    let dir = tempfile::tempdir().unwrap();
    let calendar = calendar_2021();
    let calendar_source = InMemoryCalendar::new(calendar.days().to_vec());
    let volume_source = InMemoryVolumes::new(synthetic_volumes(&calendar, &[14593]));
    let analyzer =
        TradingActivityAnalyzer::new(config(dir.path()), &calendar_source, &volume_source).unwrap();

    let events = vec![
        Event::new(day(2021, 6, 15), 14593),
        Event::new(day(2021, 9, 14), 14593),
    ];

    let report = analyzer
        .check_trading_activity(&events, Some(NormalityMethod::JarqueBera), true)
        .unwrap();

    let plots = report.plots.unwrap();
    assert_eq!(plots.succeeded(), 2);
    assert!(plots.failed.is_empty());

    let images = dir.path().join("images");
    assert!(images.join("14593_2021-06-15.png").exists());
    assert!(images.join("14593_2021-09-14.png").exists());
    assert_ne!(plots.rendered[0], plots.rendered[1]);

    let test = report.test.unwrap();
    assert_eq!(test.report.results.len(), 2);
}

#[test]
fn test_plot_failure_does_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let calendar = calendar_2021();
    let calendar_source = InMemoryCalendar::new(calendar.days().to_vec());
    let volume_source = InMemoryVolumes::new(synthetic_volumes(&calendar, &[14593, 10107]));
    let analyzer =
        TradingActivityAnalyzer::new(config(dir.path()), &calendar_source, &volume_source).unwrap();

    // A directory squatting on the image path makes that one write fail
    std::fs::create_dir_all(dir.path().join("images").join("14593_2021-06-15.png")).unwrap();

    let events = vec![
        Event::new(day(2021, 6, 15), 14593),
        Event::new(day(2021, 6, 15), 10107),
    ];
    let data = analyzer.fetch_trading_data(&events).unwrap();
    let summary = analyzer.plot_trading_activity(&data).unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].event.security_id, 14593);
    assert!(dir.path().join("images").join("10107_2021-06-15.png").is_file());
}

#[test]
fn test_out_of_range_event_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let calendar = calendar_2021();
    let calendar_source = InMemoryCalendar::new(calendar.days().to_vec());
    let volume_source = InMemoryVolumes::new(synthetic_volumes(&calendar, &[14593]));
    let analyzer =
        TradingActivityAnalyzer::new(config(dir.path()), &calendar_source, &volume_source).unwrap();

    // Only two sessions precede 2021-01-06, the window needs five
    let data = analyzer
        .fetch_trading_data(&[Event::new(day(2021, 1, 6), 14593)])
        .unwrap();

    assert!(data.activities.is_empty());
    assert!(matches!(
        data.failures[0].error,
        AnalysisError::OutOfRange { .. }
    ));
}

#[test]
fn test_csv_sources_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let calendar = TradingCalendar::weekdays(day(2021, 6, 1), day(2021, 6, 30), &[]).unwrap();

    let dsf_path = dir.path().join("dsf.csv");
    let mut file = std::fs::File::create(&dsf_path).unwrap();
    writeln!(file, "permno,date,vol").unwrap();
    for (i, date) in calendar.days().iter().enumerate() {
        // Leave the anchor day blank for 14593
        if *date == day(2021, 6, 15) {
            writeln!(file, "14593,{},", date).unwrap();
        } else {
            writeln!(file, "14593,{},{}", date, 100 + i * 10).unwrap();
        }
    }
    // Duplicate record: the first one must win
    writeln!(file, "14593,2021-06-16,1").unwrap();
    drop(file);

    let events_path = dir.path().join("events.csv");
    DataLoader::save_events(&[Event::new(day(2021, 6, 15), 14593)], &events_path).unwrap();
    let events = DataLoader::load_events(&events_path).unwrap();

    let source = CsvVolumeSource::new(&dsf_path);
    let analyzer = TradingActivityAnalyzer::new(config(dir.path()), &source, &source).unwrap();

    let first = analyzer.fetch_trading_data(&events).unwrap();
    let second = analyzer.fetch_trading_data(&events).unwrap();
    assert_eq!(first.activities, second.activities);

    let rows = &first.activities[0].rows;
    assert_eq!(rows.len(), 11);
    let anchor = rows.iter().find(|r| r.relative_position == 0).unwrap();
    assert_eq!(anchor.date, day(2021, 6, 15));
    assert_eq!(anchor.volume, None);

    let next = rows.iter().find(|r| r.relative_position == 1).unwrap();
    assert_eq!(next.date, day(2021, 6, 16));
    assert_eq!(next.volume, Some(210.0));

    let path = analyzer.export_windows(&first).unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    assert_eq!(content.lines().count(), 12);
    assert!(content.lines().any(|l| l == "2021-06-15,14593,0,2021-06-15,"));
}

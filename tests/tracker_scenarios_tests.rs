//! End-to-end scenarios for scoped region timing

use steptimer::clock::ManualClock;
use steptimer::device::NoDevice;
use steptimer::event_log::MemorySink;
use steptimer::{TimedRegionTracker, TimerConfig};

fn tracker(config: TimerConfig) -> (TimedRegionTracker, ManualClock, MemorySink) {
    let clock = ManualClock::new(0.0);
    let sink = MemorySink::new();
    let tracker = TimedRegionTracker::new(config)
        .with_clock(clock.clone())
        .with_device(NoDevice)
        .with_seed(2024)
        .with_sink(sink.clone());
    (tracker, clock, sink)
}

#[test]
fn test_counts_and_totals_after_n_runs() {
    let (mut timer, clock, _) = tracker(TimerConfig::default().with_skip_first(false));
    let durations = [0.5, 0.25, 1.0, 2.0, 0.125];
    for d in durations {
        timer.measure("batch.forward", |_| clock.advance(d));
    }
    let stats = timer.stats("batch.forward").unwrap();
    assert_eq!(stats.call_count, durations.len() as u64);
    assert_eq!(stats.total_duration, durations.iter().sum::<f64>());
}

#[test]
fn test_skip_first_scenario() {
    let (mut timer, clock, _) = tracker(TimerConfig::default().with_verbosity_level(1));
    for d in [1.0, 2.0, 3.0] {
        timer.region("step").verbosity(1).run(|_| clock.advance(d));
    }
    let stats = timer.stats("step").unwrap();
    assert_eq!(stats.call_count, 2);
    assert_eq!(stats.total_duration, 5.0);
    assert_eq!(stats.average(), Some(2.5));
}

#[test]
fn test_verbosity_filtered_label_absent_everywhere() {
    let (mut timer, clock, sink) = tracker(TimerConfig::default());
    for _ in 0..5 {
        timer.region("debug").verbosity(5).run(|_| clock.advance(1.0));
    }
    assert!(timer.stats("debug").is_none());
    assert!(timer.summary().is_none());
    assert!(timer.export().event("debug").is_none());
    assert!(sink.is_empty());
}

#[test]
fn test_series_length_counts_discarded_measurement() {
    let (mut timer, clock, _) = tracker(TimerConfig::default());
    for _ in 0..4 {
        timer.measure("batch.reduce", |_| clock.advance(0.5));
    }
    assert_eq!(timer.series().len(), 4);
    assert_eq!(timer.stats("batch.reduce").unwrap().call_count, 3);
}

#[test]
fn test_summary_empty_then_single_row() {
    let (mut timer, clock, _) = tracker(TimerConfig::default().with_skip_first(false));
    assert!(timer.summary().is_none());

    timer.measure("x", |_| clock.advance(1.0));
    let summary = timer.summary().unwrap();
    let row = summary
        .lines()
        .find(|l| l.starts_with("- x "))
        .expect("row for x");
    let count: u64 = row.split('|').nth(1).unwrap().trim().parse().unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_training_loop_summary() {
    let (mut timer, clock, _) = tracker(TimerConfig::default());
    for epoch in 0..3 {
        for _ in 0..4 {
            timer.region("batch").epoch(epoch as f64).run(|timer| {
                timer.measure("batch.forward", |_| clock.advance(0.25));
                timer.measure("batch.reduce", |_| clock.advance(0.125));
                clock.advance(0.125);
            });
            // Data loading between batches
            clock.advance(0.5);
        }
    }

    let summary = timer.summary().unwrap();
    let lines: Vec<_> = summary.lines().collect();
    assert!(lines[0].starts_with("--- Timer summary"));
    assert!(lines[1].contains("Event"));
    assert!(lines[2].starts_with("- batch "));
    assert!(lines[3].starts_with("- batch.forward"));
    assert!(lines[4].starts_with("- batch.reduce"));

    // 11 counted batches of 0.5s; sub-labels do not add to the total
    let total = lines
        .iter()
        .find(|l| l.starts_with("- total_time"))
        .unwrap();
    assert!(total.contains("|     11 |     5.50000s |"));

    // 5.5s inside batches over a 10.5s span
    assert!(lines[2].ends_with("|  52.4%"));
}

#[test]
fn test_sampled_events_carry_epoch() {
    let (mut timer, clock, sink) = tracker(TimerConfig::default());
    for epoch in 0..2 {
        timer.region("eval").epoch(epoch as f64).run(|_| clock.advance(1.0));
    }
    // First counted measurement is always logged
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].epoch, 1.0);
    assert!(events[0].log_line().contains("(event:eval)"));
}

#[test]
fn test_config_from_toml_drives_tracker() {
    let config = TimerConfig::from_toml_str(
        r#"
        verbosity_level = 2
        skip_first = false
        "#,
    )
    .unwrap();
    let (mut timer, clock, _) = tracker(config);
    timer.region("detail").verbosity(2).run(|_| clock.advance(1.0));
    timer.region("trace").verbosity(3).run(|_| clock.advance(1.0));
    assert_eq!(timer.stats("detail").unwrap().call_count, 1);
    assert!(timer.stats("trace").is_none());
}

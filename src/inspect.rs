//! Text rendering of saved exports for the `steptimer` binary

use crate::cli::SortKey;
use crate::export::{EventRecord, TimerExport, SERIES_KEY};
use std::fmt::Write;

/// Count, mean, min and max of a duration series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let (sum, min, max) = samples.iter().fold(
            (0.0, f64::INFINITY, f64::NEG_INFINITY),
            |(sum, min, max), &x| (sum + x, min.min(x), max.max(x)),
        );
        Some(SeriesStats {
            count: samples.len(),
            mean: sum / samples.len() as f64,
            min,
            max,
        })
    }
}

fn sorted_events(export: &TimerExport, sort: SortKey) -> Vec<&EventRecord> {
    let mut events: Vec<_> = export.events.values().collect();
    match sort {
        SortKey::Label => {}
        SortKey::Total => events.sort_by(|a, b| b.total_time.total_cmp(&a.total_time)),
        SortKey::Count => events.sort_by(|a, b| b.n_events.cmp(&a.n_events)),
        SortKey::Average => {
            events.sort_by(|a, b| b.average_duration.total_cmp(&a.average_duration))
        }
    }
    events
}

/// Table of the events in an export followed by a line about the series
pub fn render_export(export: &TimerExport, sort: SortKey) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<30} | {:>6} | {:>12} | {:>12}",
        "Event", "Count", "Average time", "Total time"
    );
    for event in sorted_events(export, sort) {
        let _ = writeln!(
            out,
            "- {:<30} | {:>6} | {:>11.5}s | {:>11.5}s",
            event.label, event.n_events, event.average_duration, event.total_time
        );
    }
    match SeriesStats::from_samples(&export.reduce_times) {
        Some(s) => {
            let _ = writeln!(
                out,
                "{}: {} samples, mean {:.5}s, min {:.5}s, max {:.5}s",
                SERIES_KEY, s.count, s.mean, s.min, s.max
            );
        }
        None => {
            let _ = writeln!(out, "{}: no samples", SERIES_KEY);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export() -> TimerExport {
        TimerExport::from_json_str(
            r#"{
                "batch": {"label": "batch", "average_duration": 2.0, "n_events": 3, "total_time": 6.0},
                "batch.forward": {"label": "batch.forward", "average_duration": 0.5, "n_events": 10, "total_time": 5.0},
                "reduce_times": [0.5, 0.25, 0.75]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_series_stats() {
        let s = SeriesStats::from_samples(&[0.5, 0.25, 0.75]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.mean, 0.5);
        assert_eq!(s.min, 0.25);
        assert_eq!(s.max, 0.75);
        assert!(SeriesStats::from_samples(&[]).is_none());
    }

    #[test]
    fn test_render_by_label() {
        let text = render_export(&export(), SortKey::Label);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("- batch "));
        assert!(lines[1].ends_with("|     2.00000s |     6.00000s"));
        assert!(lines[2].starts_with("- batch.forward"));
        assert_eq!(
            lines[3],
            "reduce_times: 3 samples, mean 0.50000s, min 0.25000s, max 0.75000s"
        );
    }

    #[test]
    fn test_render_by_count() {
        let text = render_export(&export(), SortKey::Count);
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[1].starts_with("- batch.forward"));
    }

    #[test]
    fn test_render_without_series() {
        let text = render_export(&TimerExport::default(), SortKey::Total);
        assert!(text.ends_with("reduce_times: no samples\n"));
    }
}

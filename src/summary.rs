//! Text summary of accumulated timings
//!
//! ```text
//! --- Timer summary -----------------------------------------------
//!   Event                          |  Count | Average time |  Frac.
//! - batch                          |     99 |     0.52000s |  98.7%
//! - batch.forward                  |     99 |     0.21000s |  39.9%
//! -----------------------------------------------------------------
//! - total_time                     |     99 |    51.48000s |
//! -----------------------------------------------------------------
//! ```
//!
//! `Frac.` is the share of the label's own wall-clock span (first counted
//! start to last end) spent inside that label. The total row only sums the
//! top-level label, never the dotted sub-labels nested in it.

use crate::tracker::LabelStats;
use std::collections::BTreeMap;
use std::fmt::Write;

const HEADER: &str = "--- Timer summary -----------------------------------------------";
const SEPARATOR: &str = "-----------------------------------------------------------------";

/// One line of the summary table
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    pub count: u64,
    /// Average duration in seconds
    pub average: f64,
    /// Percentage of the label's span spent in the label
    pub fraction: f64,
}

/// Rows for every label with at least one counted measurement, sorted
pub fn rows(stats: &BTreeMap<String, LabelStats>) -> Vec<SummaryRow> {
    stats
        .iter()
        .filter_map(|(label, s)| {
            // average() is None for call_count == 0, which keeps the division safe
            let average = s.average()?;
            Some(SummaryRow {
                label: label.clone(),
                count: s.call_count,
                average,
                fraction: s.span_percentage(),
            })
        })
        .collect()
}

/// Render the summary table
pub fn render(stats: &BTreeMap<String, LabelStats>, total_label: &str) -> String {
    let mut out = String::new();
    let (total_time, total_count) = stats
        .get(total_label)
        .map(|s| (s.total_duration, s.call_count))
        .unwrap_or((0.0, 0));

    let _ = writeln!(out, "{}", HEADER);
    let _ = writeln!(
        out,
        "  {:<30} | {:>6} | {:>12} | {:>6}",
        "Event", "Count", "Average time", "Frac."
    );
    for row in rows(stats) {
        let _ = writeln!(
            out,
            "- {:<30} | {:>6} | {:>11.5}s | {:>5.1}%",
            row.label, row.count, row.average, row.fraction
        );
    }
    let _ = writeln!(out, "{}", SEPARATOR);
    let _ = writeln!(
        out,
        "- {:<30} | {:>6} | {:>11.5}s |",
        "total_time", total_count, total_time
    );
    let _ = writeln!(out, "{}", SEPARATOR);
    out
}

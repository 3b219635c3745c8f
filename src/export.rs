//! JSON export of accumulated timings
//!
//! The export is a single JSON object. Every counted label maps to its
//! record and the raw series sits under the reserved `reduce_times` key:
//!
//! ```json
//! {
//!   "batch": {"label": "batch", "average_duration": 0.52, "n_events": 99, "total_time": 51.48},
//!   "reduce_times": [0.011, 0.009, 0.010]
//! }
//! ```
//!
//! Plotting and comparison tools read this file; `TimerExport` is also the
//! reader side.

use crate::error::{Result, TimerError};
use crate::tracker::LabelStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level key holding the raw series
pub const SERIES_KEY: &str = "reduce_times";

/// Exported statistics of one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub label: String,
    pub average_duration: f64,
    pub n_events: u64,
    pub total_time: f64,
}

/// Complete export document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimerExport {
    #[serde(flatten)]
    pub events: BTreeMap<String, EventRecord>,
    /// Raw durations of the series label, in recording order
    #[serde(default)]
    pub reduce_times: Vec<f64>,
}

impl TimerExport {
    /// Build the export from tracker statistics
    ///
    /// Labels without a counted measurement are left out.
    pub fn from_stats(stats: &BTreeMap<String, LabelStats>, series: &[f64]) -> Self {
        let mut events = BTreeMap::new();
        for (label, s) in stats {
            let Some(average_duration) = s.average() else {
                continue;
            };
            if label == SERIES_KEY {
                tracing::warn!(label = %label, "Label collides with the series key, not exported");
                continue;
            }
            events.insert(
                label.clone(),
                EventRecord {
                    label: label.clone(),
                    average_duration,
                    n_events: s.call_count,
                    total_time: s.total_duration,
                },
            );
        }
        TimerExport {
            events,
            reduce_times: series.to_vec(),
        }
    }

    pub fn event(&self, label: &str) -> Option<&EventRecord> {
        self.events.get(label)
    }

    /// Write as compact JSON
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Write to `path`, truncating any previous content
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| TimerError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(|e| TimerError::io(path, e))?;
        tracing::debug!(path = %path.display(), events = self.events.len(), "Saved timer summary");
        Ok(())
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TimerError::io(path, e))?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_stats() -> BTreeMap<String, LabelStats> {
        let mut map = BTreeMap::new();
        map.insert(
            "batch".to_string(),
            LabelStats {
                total_duration: 6.0,
                call_count: 4,
                first_start: Some(0.0),
                last_end: 8.0,
            },
        );
        map.insert(
            "warmup".to_string(),
            LabelStats {
                last_end: 1.0,
                ..LabelStats::default()
            },
        );
        map
    }

    #[test]
    fn test_from_stats_skips_uncounted() {
        let export = TimerExport::from_stats(&sample_stats(), &[0.5, 0.25]);
        assert_eq!(export.events.len(), 1);
        let batch = export.event("batch").unwrap();
        assert_eq!(batch.label, "batch");
        assert_eq!(batch.average_duration, 1.5);
        assert_eq!(batch.n_events, 4);
        assert_eq!(batch.total_time, 6.0);
        assert_eq!(export.reduce_times, vec![0.5, 0.25]);
    }

    #[test]
    fn test_json_shape() {
        let export = TimerExport::from_stats(&sample_stats(), &[0.5]);
        let mut buf = Vec::new();
        export.write_to(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["batch"]["label"], "batch");
        assert_eq!(value["batch"]["average_duration"], 1.5);
        assert_eq!(value["batch"]["n_events"], 4);
        assert_eq!(value["batch"]["total_time"], 6.0);
        assert_eq!(value["reduce_times"], serde_json::json!([0.5]));
        assert!(value.get("warmup").is_none());
    }

    #[test]
    fn test_empty_export_still_has_series_key() {
        let export = TimerExport::from_stats(&BTreeMap::new(), &[]);
        let mut buf = Vec::new();
        export.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), r#"{"reduce_times":[]}"#);
    }

    #[test]
    fn test_series_key_label_not_exported() {
        let mut stats = sample_stats();
        stats.insert(
            SERIES_KEY.to_string(),
            LabelStats {
                total_duration: 1.0,
                call_count: 1,
                first_start: Some(0.0),
                last_end: 1.0,
            },
        );
        let export = TimerExport::from_stats(&stats, &[2.0]);
        assert!(export.event(SERIES_KEY).is_none());
        assert_eq!(export.reduce_times, vec![2.0]);
    }

    #[test]
    fn test_save_overwrites_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timer_summary.json");
        fs::write(&path, "x".repeat(4096)).unwrap();

        let export = TimerExport::from_stats(&sample_stats(), &[0.5, 0.25]);
        export.save(&path).unwrap();

        let loaded = TimerExport::from_file(&path).unwrap();
        assert_eq!(loaded, export);
    }

    #[test]
    fn test_save_to_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("summary.json");
        let err = TimerExport::default().save(&path).unwrap_err();
        assert!(matches!(err, TimerError::Io { .. }));
    }

    #[test]
    fn test_invalid_json_is_json_error() {
        let err = TimerExport::from_json_str("{\"batch\": 3}").unwrap_err();
        assert!(matches!(err, TimerError::Json(_)));
    }

    #[test]
    fn test_missing_series_key_defaults_to_empty() {
        let export = TimerExport::from_json_str(
            r#"{"step": {"label": "step", "average_duration": 2.5, "n_events": 2, "total_time": 5.0}}"#,
        )
        .unwrap();
        assert!(export.reduce_times.is_empty());
        assert_eq!(export.event("step").unwrap().n_events, 2);
    }
}

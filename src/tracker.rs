//! Scoped timing of labeled code regions
//!
//! `TimedRegionTracker` measures the wall-clock duration of code regions,
//! keeps per-label totals across repeated runs, logs a sample of the
//! individual measurements and renders a summary or JSON export on demand.
//!
//! # Per-label lifecycle
//!
//! ```text
//! UNSEEN --first, skip_first--> TRACKED-ZEROED --next--> ACCUMULATING
//! UNSEEN --first, !skip_first-----------------------> ACCUMULATING
//! ```
//!
//! Only `reset` brings a label back to UNSEEN.
//!
//! # Example
//! ```
//! use steptimer::{TimedRegionTracker, TimerConfig};
//!
//! let mut timer = TimedRegionTracker::new(TimerConfig::default().with_skip_first(false));
//! let loss = timer.measure("batch", |timer| {
//!     timer.measure("batch.forward", |_| 0.25)
//! });
//! assert_eq!(loss, 0.25);
//! assert_eq!(timer.stats("batch").unwrap().call_count, 1);
//! assert_eq!(timer.stats("batch.forward").unwrap().call_count, 1);
//! ```

use crate::clock::{Clock, SystemClock};
use crate::config::TimerConfig;
use crate::device::{self, DeviceSync};
use crate::error::Result;
use crate::event_log::{EventSink, TimingEvent, TracingSink};
use crate::export::TimerExport;
use crate::summary::{self, SummaryRow};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::BTreeMap;
use std::path::Path;

/// Epoch marker used when the caller does not supply one
pub const NO_EPOCH: f64 = -1.0;

/// Verbosity of a request that does not specify one
pub const DEFAULT_VERBOSITY: u32 = 1;

/// Accumulated statistics of one label
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelStats {
    /// Sum of counted durations in seconds
    pub total_duration: f64,
    /// Number of counted measurements
    pub call_count: u64,
    /// Start of the first counted measurement
    pub first_start: Option<f64>,
    /// End of the most recent measurement
    pub last_end: f64,
}

impl LabelStats {
    /// Mean counted duration, `None` while nothing has been counted
    pub fn average(&self) -> Option<f64> {
        if self.call_count == 0 {
            return None;
        }
        Some(self.total_duration / self.call_count as f64)
    }

    /// Wall-clock span from the first counted start to the last end
    pub fn span(&self) -> Option<f64> {
        self.first_start.map(|first| self.last_end - first)
    }

    /// Share of the label's own span spent inside the label, in percent
    ///
    /// Zero when the span is empty.
    pub fn span_percentage(&self) -> f64 {
        match self.span() {
            Some(span) if span > 0.0 => 100.0 * self.total_duration / span,
            _ => 0.0,
        }
    }
}

/// An opened measurement
///
/// Returned by [`TimedRegionTracker::start`] and committed with
/// [`TimedRegionTracker::finish`]. A guard that is dropped instead of
/// finished (early return, `?`, panic) leaves the tracker untouched.
///
/// A guard is single-use: `finish` takes it by value and it cannot be
/// cloned, so one run of a region is committed at most once.
///
/// ```compile_fail
/// use steptimer::TimedRegionTracker;
///
/// let mut timer = TimedRegionTracker::default();
/// let guard = timer.start("batch.reduce");
/// let copy = guard.clone();
/// timer.finish(guard);
/// timer.finish(copy);
/// ```
#[must_use = "a region guard does nothing unless passed to finish()"]
#[derive(Debug)]
pub struct RegionGuard {
    label: String,
    epoch: f64,
    start: Option<f64>,
}

impl RegionGuard {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this request passed the verbosity filter
    pub fn is_timed(&self) -> bool {
        self.start.is_some()
    }
}

/// Builder for a single measurement with non-default epoch or verbosity
#[derive(Debug)]
pub struct Region<'a> {
    tracker: &'a mut TimedRegionTracker,
    label: &'a str,
    epoch: f64,
    verbosity: u32,
}

impl Region<'_> {
    /// Epoch/step marker reported with sampled events
    pub fn epoch(mut self, epoch: f64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Open the measurement without running anything
    pub fn start(self) -> RegionGuard {
        self.tracker.begin(self.label, self.epoch, self.verbosity)
    }

    /// Time `f`, which receives the tracker for nested regions
    pub fn run<T>(self, f: impl FnOnce(&mut TimedRegionTracker) -> T) -> T {
        let Region {
            tracker,
            label,
            epoch,
            verbosity,
        } = self;
        let guard = tracker.begin(label, epoch, verbosity);
        let out = f(&mut *tracker);
        tracker.finish(guard);
        out
    }

    /// Time a fallible `f`; an `Err` is returned as-is and nothing is recorded
    pub fn try_run<T, E>(
        self,
        f: impl FnOnce(&mut TimedRegionTracker) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let Region {
            tracker,
            label,
            epoch,
            verbosity,
        } = self;
        let guard = tracker.begin(label, epoch, verbosity);
        let out = f(&mut *tracker)?;
        tracker.finish(guard);
        Ok(out)
    }
}

/// Per-label timing statistics for one process run
pub struct TimedRegionTracker {
    config: TimerConfig,
    clock: Box<dyn Clock>,
    device: Box<dyn DeviceSync>,
    rng: Box<dyn RngCore + Send>,
    sink: Box<dyn EventSink>,
    stats: BTreeMap<String, LabelStats>,
    series: Vec<f64>,
}

impl std::fmt::Debug for TimedRegionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedRegionTracker")
            .field("config", &self.config)
            .field("device_present", &self.device.is_present())
            .field("stats", &self.stats)
            .field("series_len", &self.series.len())
            .finish()
    }
}

impl Default for TimedRegionTracker {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

impl TimedRegionTracker {
    /// Create a tracker reading the system clock and logging through `tracing`
    ///
    /// The accelerator backend is auto-detected; without one, device
    /// synchronization is a no-op.
    pub fn new(config: TimerConfig) -> Self {
        TimedRegionTracker {
            config,
            clock: Box::new(SystemClock),
            device: device::detect(),
            rng: Box::new(StdRng::from_entropy()),
            sink: Box::new(TracingSink),
            stats: BTreeMap::new(),
            series: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_device(mut self, device: impl DeviceSync + 'static) -> Self {
        self.device = Box::new(device);
        self
    }

    /// Use `rng` for the event sampling draws
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Use a deterministic sampling sequence
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Whether regions are bracketed by device synchronization
    pub fn syncs_device(&self) -> bool {
        self.config.sync_before_measure && self.device.is_present()
    }

    /// Time `f` under `label` with the default epoch and verbosity
    pub fn measure<T>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.region(label).run(f)
    }

    /// Time a fallible `f` under `label`; errors pass through unrecorded
    pub fn try_measure<T, E>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        self.region(label).try_run(f)
    }

    /// Start building a measurement of `label`
    pub fn region<'a>(&'a mut self, label: &'a str) -> Region<'a> {
        Region {
            tracker: self,
            label,
            epoch: NO_EPOCH,
            verbosity: DEFAULT_VERBOSITY,
        }
    }

    /// Open a measurement of `label` with the default epoch and verbosity
    pub fn start(&mut self, label: &str) -> RegionGuard {
        self.begin(label, NO_EPOCH, DEFAULT_VERBOSITY)
    }

    /// Commit an opened measurement
    ///
    /// Returns the measured duration, or `None` when the request was
    /// filtered out by its verbosity.
    pub fn finish(&mut self, guard: RegionGuard) -> Option<f64> {
        let start = guard.start?;
        self.sync_device();
        let end = self.clock.now();
        self.record(&guard.label, guard.epoch, start, end);
        Some(end - start)
    }

    pub(crate) fn begin(&mut self, label: &str, epoch: f64, verbosity: u32) -> RegionGuard {
        let start = if verbosity > self.config.verbosity_level {
            tracing::trace!(label, verbosity, "Region above verbosity level, not timed");
            None
        } else {
            self.sync_device();
            Some(self.clock.now())
        };
        RegionGuard {
            label: label.to_string(),
            epoch,
            start,
        }
    }

    fn sync_device(&self) {
        if self.syncs_device() {
            self.device.synchronize();
        }
    }

    /// Apply one completed measurement to the statistics
    fn record(&mut self, label: &str, epoch: f64, start: f64, end: f64) {
        let duration = end - start;

        if label == self.config.series_label {
            self.series.push(duration);
        }

        let call_count = match self.stats.get_mut(label) {
            Some(stats) => {
                stats.total_duration += duration;
                stats.call_count += 1;
                stats.first_start.get_or_insert(start);
                stats.last_end = end;
                stats.call_count
            }
            None if self.config.skip_first => {
                tracing::debug!(label, duration, "Discarding first measurement of label");
                self.stats.insert(
                    label.to_string(),
                    LabelStats {
                        last_end: end,
                        ..LabelStats::default()
                    },
                );
                0
            }
            None => {
                self.stats.insert(
                    label.to_string(),
                    LabelStats {
                        total_duration: duration,
                        call_count: 1,
                        first_start: Some(start),
                        last_end: end,
                    },
                );
                1
            }
        };

        // Log with probability 1/n: rare labels always show up, hot ones thin out
        if call_count > 0 && self.rng.gen::<f64>() < 1.0 / call_count as f64 {
            self.sink.emit(&TimingEvent {
                label: label.to_string(),
                epoch,
                value: duration,
            });
        }
    }

    /// Statistics of `label`, if it has been measured since the last reset
    pub fn stats(&self, label: &str) -> Option<&LabelStats> {
        self.stats.get(label)
    }

    /// All measured labels, sorted
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    /// Raw durations recorded for the series label
    pub fn series(&self) -> &[f64] {
        &self.series
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Forget every label and the series; configuration is kept
    ///
    /// Guards opened before the reset are not invalidated. Finishing one
    /// afterwards commits it into the fresh statistics, with a start time
    /// that predates the reset.
    pub fn reset(&mut self) {
        self.stats.clear();
        self.series.clear();
    }

    /// Rows of the summary table: counted labels in lexicographic order
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        summary::rows(&self.stats)
    }

    /// Human-readable summary table, `None` before anything was measured
    pub fn summary(&self) -> Option<String> {
        if self.stats.is_empty() {
            return None;
        }
        Some(summary::render(&self.stats, &self.config.total_label))
    }

    /// Machine-readable form of the current statistics
    pub fn export(&self) -> TimerExport {
        TimerExport::from_stats(&self.stats, &self.series)
    }

    /// Write the JSON export to `path`, replacing any existing content
    pub fn save_summary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.export().save(path)
    }
}

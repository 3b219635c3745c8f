//! Sampled timing events and their log line format
//!
//! The tracker hands every sampled measurement to an `EventSink`. The
//! default sink writes one human-readable line per event through `tracing`:
//!
//! ```text
//! timer                - epoch:  3.000, value:  0.125 (event:batch.forward)
//! ```

use std::sync::{Arc, Mutex, PoisonError};

/// Component name carried by every timing event
pub const TIMER_COMPONENT: &str = "timer";

/// One sampled measurement
#[derive(Debug, Clone, PartialEq)]
pub struct TimingEvent {
    /// Label of the measured region
    pub label: String,
    /// Epoch/step marker supplied by the caller (-1.0 when absent)
    pub epoch: f64,
    /// Measured duration in seconds
    pub value: f64,
}

impl TimingEvent {
    /// Render the event as a log line
    pub fn log_line(&self) -> String {
        format_log_line(
            TIMER_COMPONENT,
            &[("epoch", self.epoch), ("value", self.value)],
            &[("event", self.label.as_str())],
        )
    }
}

/// Format a named set of values and tags as a single line
///
/// Values are printed sorted by key with three decimals, tags in the order
/// given.
pub fn format_log_line(name: &str, values: &[(&str, f64)], tags: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, f64)> = values.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let values = sorted
        .iter()
        .map(|(key, value)| format!("{}:{:7.3}", key, value))
        .collect::<Vec<_>>()
        .join(", ");
    let tags = tags
        .iter()
        .map(|(key, tag)| format!("{}:{}", key, tag))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{:<20} - {} ({})", name, values, tags)
}

/// Receiver of sampled timing events
pub trait EventSink: Send {
    fn emit(&mut self, event: &TimingEvent);
}

/// Writes each event as an `info` line through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &TimingEvent) {
        tracing::info!(target: "steptimer", "{}", event.log_line());
    }
}

/// Keeps events in memory
///
/// Clones share one buffer, so a test can hand one clone to the tracker and
/// inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<TimingEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events captured so far
    pub fn events(&self) -> Vec<TimingEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: &TimingEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

//! Timer configuration
//!
//! A `TimerConfig` is passed explicitly when a tracker is constructed and is
//! never changed afterwards (not even by `reset`). It can be built in code or
//! loaded from a TOML file:
//!
//! ```toml
//! verbosity_level = 2
//! skip_first = false
//! sync_before_measure = true
//! series_label = "batch.reduce"
//! total_label = "batch"
//! ```

use crate::error::{Result, TimerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Label whose every raw duration is kept in the exported series
pub const DEFAULT_SERIES_LABEL: &str = "batch.reduce";

/// Only this exact label contributes to the summary's total-time row
pub const DEFAULT_TOTAL_LABEL: &str = "batch";

/// Configuration of a `TimedRegionTracker`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Requests with a verbosity strictly above this level are not timed
    pub verbosity_level: u32,
    /// Discard the first measurement of every label (warm-up)
    pub skip_first: bool,
    /// Synchronize the attached device before and after each region
    pub sync_before_measure: bool,
    /// Label recorded into the raw duration series
    pub series_label: String,
    /// Label summed into the summary's total-time row
    pub total_label: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            verbosity_level: 1,
            skip_first: true,
            sync_before_measure: true,
            series_label: DEFAULT_SERIES_LABEL.to_string(),
            total_label: DEFAULT_TOTAL_LABEL.to_string(),
        }
    }
}

impl TimerConfig {
    /// Load a configuration from a TOML file
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TimerError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_verbosity_level(mut self, level: u32) -> Self {
        self.verbosity_level = level;
        self
    }

    pub fn with_skip_first(mut self, skip_first: bool) -> Self {
        self.skip_first = skip_first;
        self
    }

    pub fn with_sync_before_measure(mut self, sync: bool) -> Self {
        self.sync_before_measure = sync;
        self
    }

    pub fn with_series_label(mut self, label: impl Into<String>) -> Self {
        self.series_label = label.into();
        self
    }

    pub fn with_total_label(mut self, label: impl Into<String>) -> Self {
        self.total_label = label.into();
        self
    }
}

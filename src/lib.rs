//! steptimer - scoped wall-clock timing of labeled code regions
//!
//! This library measures how long labeled regions of a program take,
//! accumulates per-label statistics across repeated runs, logs a decaying
//! sample of individual measurements and produces a text summary or a JSON
//! export for downstream analysis. Accelerator work can be synchronized
//! around every region so asynchronous device time is counted.

pub mod cli;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod event_log;
pub mod export;
pub mod inspect;
pub mod shared;
pub mod summary;
pub mod tracker;

pub use config::TimerConfig;
pub use error::TimerError;
pub use export::{EventRecord, TimerExport};
pub use shared::SharedTracker;
pub use tracker::{LabelStats, RegionGuard, TimedRegionTracker};

//! Tracker shared between threads
//!
//! `TimedRegionTracker` takes `&mut self` and is meant for one thread of
//! control. `SharedTracker` puts it behind a mutex so several workers can
//! measure into the same statistics. The lock is held only while a
//! measurement is opened and while it is committed; the region body runs
//! unlocked, so regions on different threads overlap freely.

use crate::error::Result;
use crate::tracker::{RegionGuard, TimedRegionTracker, DEFAULT_VERBOSITY, NO_EPOCH};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to a mutex-protected tracker
#[derive(Debug, Clone)]
pub struct SharedTracker {
    inner: Arc<Mutex<TimedRegionTracker>>,
}

impl From<TimedRegionTracker> for SharedTracker {
    fn from(tracker: TimedRegionTracker) -> Self {
        SharedTracker::new(tracker)
    }
}

impl SharedTracker {
    pub fn new(tracker: TimedRegionTracker) -> Self {
        SharedTracker {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TimedRegionTracker> {
        // A panicking region never holds the lock, so the state stays consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn region<'a>(&'a self, label: &'a str) -> SharedRegion<'a> {
        SharedRegion {
            tracker: self,
            label,
            epoch: NO_EPOCH,
            verbosity: DEFAULT_VERBOSITY,
        }
    }

    pub fn measure<T>(&self, label: &str, f: impl FnOnce() -> T) -> T {
        self.region(label).run(f)
    }

    pub fn try_measure<T, E>(
        &self,
        label: &str,
        f: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        self.region(label).try_run(f)
    }

    pub fn start(&self, label: &str) -> RegionGuard {
        self.region(label).start()
    }

    pub fn finish(&self, guard: RegionGuard) -> Option<f64> {
        self.lock().finish(guard)
    }

    /// Run `f` with exclusive access to the tracker
    pub fn with_tracker<R>(&self, f: impl FnOnce(&mut TimedRegionTracker) -> R) -> R {
        let mut tracker = self.lock();
        f(&mut *tracker)
    }

    pub fn summary(&self) -> Option<String> {
        self.lock().summary()
    }

    pub fn save_summary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.lock().save_summary(path)
    }

    /// Forget all statistics; see [`TimedRegionTracker::reset`] for guards
    /// that are still open
    pub fn reset(&self) {
        self.lock().reset();
    }
}

/// Builder for one measurement on a `SharedTracker`
#[derive(Debug)]
pub struct SharedRegion<'a> {
    tracker: &'a SharedTracker,
    label: &'a str,
    epoch: f64,
    verbosity: u32,
}

impl SharedRegion<'_> {
    pub fn epoch(mut self, epoch: f64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn start(self) -> RegionGuard {
        self.tracker
            .lock()
            .begin(self.label, self.epoch, self.verbosity)
    }

    pub fn run<T>(self, f: impl FnOnce() -> T) -> T {
        let tracker = self.tracker;
        let guard = self.start();
        let out = f();
        tracker.finish(guard);
        out
    }

    pub fn try_run<T, E>(
        self,
        f: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let tracker = self.tracker;
        let guard = self.start();
        let out = f()?;
        tracker.finish(guard);
        Ok(out)
    }
}

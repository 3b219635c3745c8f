//! Wall-clock time sources
//!
//! Timestamps are seconds as `f64`. `SystemClock` reads the system wall
//! clock (seconds since the UNIX epoch), so it can jump when the system
//! time is adjusted. `ManualClock` only moves when told to and is what the
//! tests use to produce exact durations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock timestamps in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }
}

/// Manually driven clock
///
/// Clones share the same time, so a region body can advance the clock the
/// tracker reads from.
///
/// # Example
/// ```
/// use steptimer::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(10.0);
/// let handle = clock.clone();
/// handle.advance(1.5);
/// assert_eq!(clock.now(), 11.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        ManualClock {
            bits: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    /// Move the clock forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        let mut current = self.bits.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + seconds).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

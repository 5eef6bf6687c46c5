//! Virtual clock sources for the tick/stick counters.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Monotonic nanosecond clock.
pub trait ClockSource: Send + Sync {
    fn now_ns(&self) -> i64;
}

/// Host monotonic time, measured from construction.
#[derive(Debug)]
pub struct HostClock {
    origin: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for HostClock {
    fn now_ns(&self) -> i64 {
        self.origin.elapsed().as_nanos() as i64
    }
}

/// Clock that only moves when told to. Deterministic runs and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    ns: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ns: i64) -> Self {
        Self {
            ns: AtomicI64::new(start_ns),
        }
    }

    pub fn set(&self, ns: i64) {
        self.ns.store(ns, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ns: i64) {
        self.ns.fetch_add(delta_ns, Ordering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now_ns(&self) -> i64 {
        self.ns.load(Ordering::SeqCst)
    }
}

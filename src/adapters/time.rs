//! Clock adapters.
//!
//! Provides monotonic millisecond time for the [`RetryTimer`] and the
//! trigger scheduler.
//!
//! - [`MonotonicClock`] wraps `std::time::Instant` for host runs.
//! - [`ManualClock`] only moves when told to; clones share one counter so a
//!   test can hold a handle while the cycle owns another.
//!
//! [`RetryTimer`]: crate::retry_timer::RetryTimer

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::app::ports::TimePort;

/// Milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimePort for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock for deterministic tests and simulations.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(ms));
    }

    pub fn set_ms(&self, ms: u64) {
        self.now_ms.set(ms);
    }
}

impl TimePort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

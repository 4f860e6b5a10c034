//! Restartable countdown used to space out polled retries.
//!
//! A single instance is shared by every retry point in the cycle: only one
//! retry can be outstanding at a time because sensors are serviced strictly
//! one after the other.

use core::time::Duration;

use crate::app::ports::TimePort;

pub struct RetryTimer<T> {
    clock: T,
    /// `None` until the first `restart()`.
    deadline_ms: Option<u64>,
    restarts: u32,
}

impl<T: TimePort> RetryTimer<T> {
    pub fn new(clock: T) -> Self {
        Self {
            clock,
            deadline_ms: None,
            restarts: 0,
        }
    }

    /// Arm the timer for `duration` from now, replacing any earlier deadline.
    pub fn restart(&mut self, duration: Duration) {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.deadline_ms = Some(self.clock.now_ms().saturating_add(ms));
        self.restarts = self.restarts.wrapping_add(1);
    }

    /// `true` once the armed duration has elapsed, or if never armed.
    pub fn is_expired(&self) -> bool {
        match self.deadline_ms {
            None => true,
            Some(deadline) => self.clock.now_ms() >= deadline,
        }
    }

    /// Number of times `restart()` has been called.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}

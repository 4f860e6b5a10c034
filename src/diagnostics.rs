//! Runtime diagnostics for the measurement cycle.
//!
//! Retries are unbounded, so a sensor that never answers leaves the cycle
//! parked in one Ping/Init state forever.  These counters make that visible
//! (per channel, per phase, and as a running streak) without changing the
//! retry behaviour itself.

use core::fmt;

use serde::Serialize;

use crate::sensors::Channel;

/// Which polled operation a retry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RetryPhase {
    Presence,
    Configure,
}

impl fmt::Display for RetryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => write!(f, "presence"),
            Self::Configure => write!(f, "configure"),
        }
    }
}

/// Raised every `stall_warn_every` consecutive retries in one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StallReport {
    pub channel: Channel,
    pub phase: RetryPhase,
    /// Consecutive attempts that came back `Pending`.
    pub attempts: u32,
}

/// Counters accumulated over the cycle's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleMetrics {
    /// Calls to `step_once()`.
    pub steps: u64,
    /// State transitions taken.
    pub transitions: u64,
    /// Pending presence answers, indexed by channel.
    pub presence_retries: [u32; 2],
    /// Pending configure answers, indexed by channel.
    pub configure_retries: [u32; 2],
    /// Completed two-sensor measurements.
    pub measurements: u32,
    /// Consecutive retries in the current Ping/Init state.
    pub retry_streak: u32,
}

impl CycleMetrics {
    /// Count one `Pending` answer and return the updated streak.
    pub fn record_retry(&mut self, channel: Channel, phase: RetryPhase) -> u32 {
        let slot = match phase {
            RetryPhase::Presence => &mut self.presence_retries[channel.index()],
            RetryPhase::Configure => &mut self.configure_retries[channel.index()],
        };
        *slot = slot.saturating_add(1);
        // Wraps past u32::MAX back to 1, so the stall cadence keeps going.
        self.retry_streak = self.retry_streak.checked_add(1).unwrap_or(1);
        self.retry_streak
    }

    pub fn clear_streak(&mut self) {
        self.retry_streak = 0;
    }

    pub fn total_retries(&self) -> u32 {
        self.presence_retries
            .iter()
            .chain(self.configure_retries.iter())
            .fold(0u32, |acc, n| acc.saturating_add(*n))
    }
}

//! Measurement trigger scheduler.
//!
//! Decides *when* a measurement should be requested.  The scheduler
//! notifies a [`SchedulerDelegate`] when schedules fire; the host main loop
//! implements the delegate to call `Requester::trigger_measurement`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │     ┌───────────┐        ┌──────────┐        ┌──────────┐    │
//! │     │ Periodic  │        │ One-Shot │        │ External │    │
//! │     │ Schedule  │        │ Timer    │        │ caller   │    │
//! │     └─────┬─────┘        └─────┬────┘        └─────┬────┘    │
//! │           │                    │                   │         │
//! │           ▼                    ▼                   │         │
//! │  ┌──────────────────────────────────────┐          │         │
//! │  │          SchedulerDelegate           │          │         │
//! │  └──────────────────┬───────────────────┘          │         │
//! │                     ▼                              ▼         │
//! │              Requester::trigger_measurement()                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Time is passed in as milliseconds from any monotonic source, so the
//! scheduler runs the same under a real clock and a manual one.

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};
use log::info;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Human-readable label (e.g., "periodic-sample").
    pub label: &'static str,
    /// Type of schedule.
    pub kind: ScheduleKind,
    /// Whether this schedule is currently enabled.
    pub enabled: bool,
}

/// The type of schedule determines how and when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Fire every `interval_ms`, first fire one interval after it is added.
    Periodic { interval_ms: u32 },
    /// Fire once after `delay_ms`, then auto-disable.
    OneShot { delay_ms: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
pub const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// Decoupled from the handshake: when a schedule fires it invokes the
/// [`SchedulerDelegate`] rather than touching the trigger flag directly.
pub struct TriggerScheduler {
    /// Active schedules.
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
    /// Global enable flag.
    enabled: bool,
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Next fire time; set on the first `tick()` after being added.
    due_ms: Option<u64>,
    /// Number of times this entry has fired.
    fires: u32,
}

impl Default for TriggerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerScheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
            enabled: true,
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!("Scheduler: added '{}' at slot {}", schedule.label, i);
                *slot = Some(ScheduleEntry {
                    schedule,
                    due_ms: None,
                    fires: 0,
                });
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Remove a schedule by slot index.
    pub fn remove(&mut self, slot: usize) {
        if slot < MAX_SCHEDULES {
            if let Some(entry) = &self.schedules[slot] {
                info!("Scheduler: removed '{}' from slot {}", entry.schedule.label, slot);
            }
            self.schedules[slot] = None;
        }
    }

    /// Enable or disable the entire scheduler.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check every schedule against `now_ms`.  Call once per loop pass.
    ///
    /// When a schedule fires, `delegate.on_schedule_fired()` is called with
    /// the schedule label and fire kind.  A periodic schedule that fell
    /// behind fires once and re-anchors on `now_ms`; missed periods are
    /// not replayed.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        if !self.enabled {
            return;
        }

        for slot in self.schedules.iter_mut() {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };

            let period = match entry.schedule.kind {
                ScheduleKind::Periodic { interval_ms } => interval_ms,
                ScheduleKind::OneShot { delay_ms } => delay_ms,
            };
            let due = *entry
                .due_ms
                .get_or_insert_with(|| now_ms.saturating_add(u64::from(period)));
            if now_ms < due {
                continue;
            }
            entry.fires = entry.fires.saturating_add(1);

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_ms } => {
                    info!(
                        "Scheduler: '{}' periodic fire (every {}ms)",
                        entry.schedule.label, interval_ms
                    );
                    delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::Periodic);
                    entry.due_ms = Some(now_ms.saturating_add(u64::from(interval_ms)));
                }
                ScheduleKind::OneShot { delay_ms } => {
                    info!(
                        "Scheduler: '{}' one-shot fired (after {}ms)",
                        entry.schedule.label, delay_ms
                    );
                    delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::OneShot);
                    entry.schedule.enabled = false; // Auto-disable.
                }
            }
        }
    }

    /// Number of active (enabled) schedules.
    pub fn active_count(&self) -> usize {
        self.schedules
            .iter()
            .filter(|s| s.as_ref().is_some_and(|e| e.schedule.enabled))
            .count()
    }

    /// Times the schedule in `slot` has fired, or `None` if the slot is empty.
    pub fn fire_count(&self, slot: usize) -> Option<u32> {
        self.schedules.get(slot)?.as_ref().map(|e| e.fires)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

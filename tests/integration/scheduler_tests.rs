//! Integration tests for TriggerScheduler → Requester → MeasurementCycle.
//!
//! A manual clock drives both the scheduler and the cycle's retry timer,
//! the same way the host main loop does with a real clock.

use envmon::adapters::time::ManualClock;
use envmon::app::ports::{ScheduleFiredKind, SchedulerDelegate, TimePort};
use envmon::config::CycleConfig;
use envmon::fsm::StateId;
use envmon::handshake::{Handshake, Requester, TriggerAck};
use envmon::scheduler::{Schedule, ScheduleKind, TriggerScheduler};

use crate::mock_hw::{RecordingSink, Script, TestCycle, rig};

/// Delegate that forwards fires to the handshake and tallies the answers.
struct Forwarder<'h> {
    requester: Requester<'h>,
    accepted: u32,
    already_pending: u32,
}

impl<'h> Forwarder<'h> {
    fn new(requester: Requester<'h>) -> Self {
        Self {
            requester,
            accepted: 0,
            already_pending: 0,
        }
    }
}

impl SchedulerDelegate for Forwarder<'_> {
    fn on_schedule_fired(&mut self, _label: &str, _kind: ScheduleFiredKind) {
        match self.requester.trigger_measurement() {
            TriggerAck::Accepted => self.accepted += 1,
            TriggerAck::AlreadyPending => self.already_pending += 1,
        }
    }
}

/// Run the main-loop pattern for `duration_ms` in `step_ms` increments.
/// Returns how many times new data was taken.
fn run_loop(
    sched: &mut TriggerScheduler,
    fwd: &mut Forwarder<'_>,
    cycle: &mut TestCycle<'_>,
    sink: &mut RecordingSink,
    clock: &ManualClock,
    duration_ms: u64,
    step_ms: u64,
) -> u32 {
    let mut taken = 0;
    let end = clock.now_ms() + duration_ms;
    while clock.now_ms() < end {
        sched.tick(clock.now_ms(), fwd);
        cycle.step_once(sink);
        if fwd.requester.take_new_data() {
            taken += 1;
        }
        clock.advance_ms(step_ms);
    }
    taken
}

#[test]
fn periodic_schedule_produces_one_measurement_per_interval() {
    let mut hs = Handshake::new();
    let (req, resp) = hs.split();
    let clock = ManualClock::new();
    let (mut cycle, _log) = rig(
        resp,
        &clock,
        Script {
            presence: 2,
            configure: 1,
            readout: 3,
        },
        Script {
            presence: 1,
            configure: 2,
            readout: 1,
        },
        CycleConfig::default(),
    );
    let mut sink = RecordingSink::new();
    let mut fwd = Forwarder::new(req);
    let mut sched = TriggerScheduler::new();
    sched.add(Schedule {
        label: "every-second",
        kind: ScheduleKind::Periodic { interval_ms: 1000 },
        enabled: true,
    });

    // Fires at 1000, 2000 and 3000 ms.
    let taken = run_loop(&mut sched, &mut fwd, &mut cycle, &mut sink, &clock, 3_500, 10);

    assert_eq!(taken, 3);
    assert_eq!(fwd.accepted, 3);
    assert_eq!(fwd.already_pending, 0);
    assert_eq!(cycle.metrics().measurements, 3);
    assert_eq!(cycle.state(), StateId::WaitTrigger);
}

#[test]
fn one_shot_before_discovery_is_served_after_configuration() {
    let mut hs = Handshake::new();
    let (req, resp) = hs.split();
    let clock = ManualClock::new();
    let slow = Script {
        presence: 4,
        configure: 4,
        readout: 0,
    };
    let (mut cycle, _log) = rig(resp, &clock, slow, slow, CycleConfig::default());
    let mut sink = RecordingSink::new();
    let mut fwd = Forwarder::new(req);
    let mut sched = TriggerScheduler::new();
    sched.add(Schedule {
        label: "boot",
        kind: ScheduleKind::OneShot { delay_ms: 0 },
        enabled: true,
    });

    // 16 pending answers at 100 ms each: configuration ends around 1.6 s.
    let taken = run_loop(&mut sched, &mut fwd, &mut cycle, &mut sink, &clock, 1_000, 10);
    assert_eq!(taken, 0);
    assert!(fwd.requester.is_pending());
    assert_ne!(cycle.state(), StateId::WaitTrigger);

    let taken = run_loop(&mut sched, &mut fwd, &mut cycle, &mut sink, &clock, 1_000, 10);
    assert_eq!(taken, 1);
    assert_eq!(fwd.accepted, 1);
    assert_eq!(cycle.retry_restarts(), 16);
}

#[test]
fn fast_schedule_against_slow_readout_coalesces() {
    let mut hs = Handshake::new();
    let (req, resp) = hs.split();
    let clock = ManualClock::new();
    let sluggish = Script {
        readout: 30,
        ..Default::default()
    };
    let (mut cycle, _log) = rig(resp, &clock, sluggish, Script::default(), CycleConfig::default());
    let mut sink = RecordingSink::new();
    let mut fwd = Forwarder::new(req);
    let mut sched = TriggerScheduler::new();
    sched.add(Schedule {
        label: "fast",
        kind: ScheduleKind::Periodic { interval_ms: 100 },
        enabled: true,
    });

    // Each readout takes 31 steps (310 ms) on channel A alone.
    let taken = run_loop(&mut sched, &mut fwd, &mut cycle, &mut sink, &clock, 1_000, 10);

    assert!(fwd.already_pending > 0, "fires during readout are absorbed");
    assert_eq!(taken, cycle.metrics().measurements);
    assert!(cycle.metrics().measurements < fwd.accepted + fwd.already_pending);
}

//! Mock sensors and sinks for integration tests.
//!
//! Every [`TracedSensor`] appends its calls to a shared [`BusLog`], so a test
//! can assert on the exact interleaving of operations across both channels.

use std::cell::RefCell;
use std::rc::Rc;
use std::task::Poll;

use envmon::adapters::time::ManualClock;
use envmon::app::cycle::MeasurementCycle;
use envmon::app::events::AppEvent;
use envmon::app::ports::{EventSink, SensorDriver};
use envmon::config::CycleConfig;
use envmon::fsm::StateId;
use envmon::handshake::Responder;
use envmon::sensors::{BusAddress, CalibrationData, Channel, MeasurementSample};

// ── Bus call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Presence,
    Configure,
    Readout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusCall {
    pub channel: Channel,
    pub op: Op,
    pub ready: bool,
}

pub type BusLog = Rc<RefCell<Vec<BusCall>>>;

/// Pending answers before each operation completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Script {
    pub presence: u32,
    pub configure: u32,
    /// Re-armed after every completed readout.
    pub readout: u32,
}

// ── TracedSensor ──────────────────────────────────────────────

pub struct TracedSensor {
    channel: Channel,
    address: BusAddress,
    log: BusLog,
    script: Script,
    presence_left: u32,
    configure_left: u32,
    readout_left: u32,
    calibration: CalibrationData,
    sample: MeasurementSample,
    readouts: i32,
}

#[allow(dead_code)]
impl TracedSensor {
    pub fn new(channel: Channel, script: Script, log: BusLog) -> Self {
        Self {
            channel,
            address: 0x76,
            log,
            script,
            presence_left: script.presence,
            configure_left: script.configure,
            readout_left: script.readout,
            calibration: CalibrationData::default(),
            sample: MeasurementSample::default(),
            readouts: 0,
        }
    }

    pub fn readouts(&self) -> i32 {
        self.readouts
    }

    /// Calibration this sensor hands out once configured.
    pub fn expected_calibration(channel: Channel) -> CalibrationData {
        let tag = channel.index() as i32;
        CalibrationData {
            temperature: [27_000 + tag, 26_000, -1_000],
            pressure: [36_000 + tag, -10_000, 3_000, 2_800, 140, -7, 15_500, -14_600, 6_000],
            humidity: [75, 360 + tag, 0, 310, 50, 30],
        }
    }

    /// Sample produced by the `n`th completed readout (1-based).
    pub fn expected_sample(channel: Channel, n: i32) -> MeasurementSample {
        let tag = channel.index() as i32;
        MeasurementSample {
            temperature: 2_000 + 100 * tag + n,
            pressure: 100_000_000 + 1_000 * n,
            humidity: 40_000 + 500 * tag + 10 * n,
        }
    }

    fn record(&self, op: Op, poll: Poll<()>) -> Poll<()> {
        self.log.borrow_mut().push(BusCall {
            channel: self.channel,
            op,
            ready: poll.is_ready(),
        });
        poll
    }
}

fn countdown(left: &mut u32) -> Poll<()> {
    if *left > 0 {
        *left -= 1;
        Poll::Pending
    } else {
        Poll::Ready(())
    }
}

impl SensorDriver for TracedSensor {
    fn address(&self) -> BusAddress {
        self.address
    }

    fn presence(&mut self) -> Poll<()> {
        let poll = countdown(&mut self.presence_left);
        self.record(Op::Presence, poll)
    }

    fn configure(&mut self) -> Poll<()> {
        let poll = countdown(&mut self.configure_left);
        if poll.is_ready() {
            self.calibration = Self::expected_calibration(self.channel);
        }
        self.record(Op::Configure, poll)
    }

    fn readout(&mut self) -> Poll<()> {
        let poll = countdown(&mut self.readout_left);
        if poll.is_ready() {
            self.readouts += 1;
            self.sample = Self::expected_sample(self.channel, self.readouts);
            self.readout_left = self.script.readout;
        }
        self.record(Op::Readout, poll)
    }

    fn calibration(&self) -> &CalibrationData {
        &self.calibration
    }

    fn sample(&self) -> MeasurementSample {
        self.sample
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target state of every `StateChanged`, in order.
    pub fn visited(&self) -> Vec<StateId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|&e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig helpers ───────────────────────────────────────────────

pub type TestCycle<'h> = MeasurementCycle<'h, TracedSensor, ManualClock>;

/// Build a cycle around two traced sensors sharing one bus log.
#[allow(dead_code)]
pub fn rig<'h>(
    responder: Responder<'h>,
    clock: &ManualClock,
    a: Script,
    b: Script,
    config: CycleConfig,
) -> (TestCycle<'h>, BusLog) {
    let log = BusLog::default();
    let cycle = MeasurementCycle::new(
        TracedSensor::new(Channel::A, a, log.clone()),
        TracedSensor::new(Channel::B, b, log.clone()),
        clock.clone(),
        responder,
        config,
    );
    (cycle, log)
}

/// Step with `advance_ms` between steps until `state` is reached.
/// Panics after `max_steps`.
#[allow(dead_code)]
pub fn run_until(
    cycle: &mut TestCycle<'_>,
    sink: &mut RecordingSink,
    clock: &ManualClock,
    advance_ms: u64,
    state: StateId,
    max_steps: usize,
) -> usize {
    for steps in 1..=max_steps {
        cycle.step_once(sink);
        if cycle.state() == state {
            return steps;
        }
        clock.advance_ms(advance_ms);
    }
    panic!("{:?} not reached within {} steps", state, max_steps);
}

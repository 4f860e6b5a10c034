//! Scripted BME280 stand-in.
//!
//! Answers each polled operation with a configurable number of `Pending`
//! results before completing, then produces a deterministic sample that
//! drifts a little on every readout.  Used by the host binary and by tests;
//! there is no register traffic behind it.

use core::task::Poll;

use log::trace;

use super::{BusAddress, CalibrationData, MeasurementSample, SensorData};
use crate::app::ports::SensorDriver;

/// Typical coefficients from the BME280 datasheet's worked example.
pub const REFERENCE_CALIBRATION: CalibrationData = CalibrationData {
    temperature: [27504, 26435, -1000],
    pressure: [36477, -10685, 3024, 2855, 140, -7, 15500, -14600, 6000],
    humidity: [75, 362, 0, 313, 50, 30],
};

/// Baseline reading: 21.50 C, 1013.25 hPa, 45 %RH.
pub const REFERENCE_SAMPLE: MeasurementSample = MeasurementSample {
    temperature: 2150,
    pressure: 101_325_000,
    humidity: 45_000,
};

/// How many times each operation answers `Pending` before it completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingScript {
    pub presence: u32,
    pub configure: u32,
    /// Applied to every readout, not only the first.
    pub readout: u32,
}

/// Number of times each operation has been invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounters {
    pub presence: u32,
    pub configure: u32,
    pub readout: u32,
}

pub struct SimulatedBme280 {
    data: SensorData,
    address: BusAddress,
    script: PendingScript,
    presence_left: u32,
    configure_left: u32,
    readout_left: u32,
    present: bool,
    configured: bool,
    readouts: u32,
    baseline: MeasurementSample,
    calls: OpCounters,
}

impl SimulatedBme280 {
    /// Build a sensor around `data` that answers every operation immediately.
    pub fn new(data: SensorData, address: BusAddress) -> Self {
        Self {
            data,
            address,
            script: PendingScript::default(),
            presence_left: 0,
            configure_left: 0,
            readout_left: 0,
            present: false,
            configured: false,
            readouts: 0,
            baseline: REFERENCE_SAMPLE,
            calls: OpCounters::default(),
        }
    }

    pub fn with_script(mut self, script: PendingScript) -> Self {
        self.script = script;
        self.presence_left = script.presence;
        self.configure_left = script.configure;
        self.readout_left = script.readout;
        self
    }

    pub fn with_baseline(mut self, baseline: MeasurementSample) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn calls(&self) -> OpCounters {
        self.calls
    }

    /// Completed readouts so far.
    pub fn readouts(&self) -> u32 {
        self.readouts
    }

    fn next_sample(&self) -> MeasurementSample {
        let step = (self.readouts % 8) as i32;
        MeasurementSample {
            temperature: self.baseline.temperature + step * 5,
            pressure: self.baseline.pressure - step * 1_200,
            humidity: self.baseline.humidity + step * 150,
        }
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

impl SensorDriver for SimulatedBme280 {
    fn address(&self) -> BusAddress {
        self.address
    }

    fn presence(&mut self) -> Poll<()> {
        self.calls.presence += 1;
        let poll = countdown(&mut self.presence_left);
        if poll.is_ready() {
            self.present = true;
        }
        trace!("sim 0x{:02x}: presence -> {:?}", self.address, poll);
        poll
    }

    fn configure(&mut self) -> Poll<()> {
        debug_assert!(self.present, "configure() before presence() completed");
        self.calls.configure += 1;
        let poll = countdown(&mut self.configure_left);
        if poll.is_ready() {
            self.configured = true;
            self.data.calibration = REFERENCE_CALIBRATION;
        }
        trace!("sim 0x{:02x}: configure -> {:?}", self.address, poll);
        poll
    }

    fn readout(&mut self) -> Poll<()> {
        debug_assert!(self.configured, "readout() before configure() completed");
        self.calls.readout += 1;
        let poll = countdown(&mut self.readout_left);
        if poll.is_ready() {
            self.data.sample = self.next_sample();
            self.readouts += 1;
            self.readout_left = self.script.readout;
        }
        trace!("sim 0x{:02x}: readout -> {:?}", self.address, poll);
        poll
    }

    fn calibration(&self) -> &CalibrationData {
        &self.data.calibration
    }

    fn sample(&self) -> MeasurementSample {
        self.data.sample
    }
}

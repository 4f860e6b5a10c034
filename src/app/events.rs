//! Outbound application events.
//!
//! The [`MeasurementCycle`](super::cycle::MeasurementCycle) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: log to the console, forward to a
//! telemetry link, and so on.

use serde::Serialize;

use crate::diagnostics::StallReport;
use crate::fsm::StateId;
use crate::sensors::{CalibrationData, MeasurementSample};

/// Structured events emitted by the measurement cycle.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The cycle has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// Both sensors finished configuration; coefficients indexed by channel.
    Calibrated([CalibrationData; 2]),

    /// A two-sensor measurement was handed to the requester.
    MeasurementPublished(MeasurementReport),

    /// A sensor has kept answering `Pending` in a Ping/Init state.
    SensorStalled(StallReport),
}

/// One published measurement, suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeasurementReport {
    /// 1-based count of completed measurements.
    pub sequence: u32,
    /// Samples indexed by channel.
    pub samples: [MeasurementSample; 2],
}

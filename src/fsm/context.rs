//! Shared mutable context threaded through every FSM handler.
//!
//! `CycleContext` is the single struct that state handlers read from and
//! write to.  It owns both sensor drivers, the shared retry timer, the
//! responder half of the trigger/result handshake, the published samples,
//! configuration, and diagnostics counters.

use core::time::Duration;

use crate::app::ports::{SensorDriver, TimePort};
use crate::config::CycleConfig;
use crate::diagnostics::{CycleMetrics, StallReport};
use crate::handshake::Responder;
use crate::retry_timer::RetryTimer;
use crate::sensors::{Channel, MeasurementSample};

/// The shared context passed to every state handler function.
pub struct CycleContext<'h, S, T> {
    // -- Devices --
    /// Sensor drivers, indexed by [`Channel::index`].
    pub sensors: [S; 2],

    // -- Timing --
    /// Single back-off timer shared by every Ping/Init retry point.
    pub retry: RetryTimer<T>,

    // -- Handshake --
    /// Cycle half of the trigger/result handshake.
    pub handshake: Responder<'h>,

    // -- Outputs --
    /// Samples republished on every `Published`, indexed by channel.
    pub samples: [MeasurementSample; 2],
    /// Channel currently being read within `Readout`.
    pub readout_channel: Channel,
    /// Set once both sensors have been configured.
    pub configured: bool,

    // -- Configuration --
    pub config: CycleConfig,

    // -- Diagnostics --
    pub metrics: CycleMetrics,
    /// Stall raised during the last update, drained by the cycle.
    pub stall: Option<StallReport>,
}

impl<'h, S: SensorDriver, T: TimePort> CycleContext<'h, S, T> {
    pub fn new(
        sensor_a: S,
        sensor_b: S,
        clock: T,
        handshake: Responder<'h>,
        config: CycleConfig,
    ) -> Self {
        Self {
            sensors: [sensor_a, sensor_b],
            retry: RetryTimer::new(clock),
            handshake,
            samples: [MeasurementSample::default(); 2],
            readout_channel: Channel::A,
            configured: false,
            config,
            metrics: CycleMetrics::default(),
            stall: None,
        }
    }

    pub fn sensor(&self, channel: Channel) -> &S {
        &self.sensors[channel.index()]
    }

    pub fn sensor_mut(&mut self, channel: Channel) -> &mut S {
        &mut self.sensors[channel.index()]
    }

    pub fn retry_interval(&self) -> Duration {
        self.config.retry_interval()
    }
}

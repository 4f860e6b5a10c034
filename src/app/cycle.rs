//! Measurement cycle: the cooperative core.
//!
//! [`MeasurementCycle`] owns the FSM, the state table and the shared
//! context.  A cooperative scheduler calls [`step_once`] repeatedly; each
//! call runs state updates until one of them suspends, so control returns
//! at the same points where a blocking implementation would wait.
//!
//! ```text
//!  Requester ──trigger──▶ ┌────────────────────────┐ ──▶ EventSink
//!                         │    MeasurementCycle     │
//!  Requester ◀─new data── │  FSM · RetryTimer · ×2  │ ◀── SensorDriver A/B
//!                         └────────────────────────┘
//! ```
//!
//! [`step_once`]: MeasurementCycle::step_once

use log::info;

use crate::config::CycleConfig;
use crate::diagnostics::CycleMetrics;
use crate::fsm::context::CycleContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, Transition};
use crate::handshake::Responder;
use crate::sensors::{CalibrationData, Channel, MeasurementSample};

use super::events::{AppEvent, MeasurementReport};
use super::ports::{EventSink, SensorDriver, TimePort};

/// Upper bound on state updates in a single `step_once()`.  A full lap of
/// the table is at most `COUNT` transitions, so twice that is never hit
/// by a well-formed table.
const MAX_UPDATES_PER_STEP: usize = 2 * StateId::COUNT;

/// What a single `step_once()` achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// At least one state transition happened.
    Progressed,
    /// The current state suspended without transitioning.
    Suspended,
}

// ───────────────────────────────────────────────────────────────
// MeasurementCycle
// ───────────────────────────────────────────────────────────────

/// Drives two sensors through discovery, configuration and on-demand
/// measurement.  Never blocks and never terminates.
pub struct MeasurementCycle<'h, S, T> {
    fsm: Fsm<CycleContext<'h, S, T>>,
    ctx: CycleContext<'h, S, T>,
    started: bool,
}

impl<'h, S: SensorDriver, T: TimePort> MeasurementCycle<'h, S, T> {
    /// Construct the cycle in `Idle`.  Nothing touches the sensors until
    /// the first [`step_once`](Self::step_once).
    pub fn new(
        sensor_a: S,
        sensor_b: S,
        clock: T,
        handshake: Responder<'h>,
        config: CycleConfig,
    ) -> Self {
        let ctx = CycleContext::new(sensor_a, sensor_b, clock, handshake, config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);
        Self {
            fsm,
            ctx,
            started: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial `on_enter` and announce the starting state.
    /// Called implicitly by the first `step_once()` if not called before.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        if self.started {
            return;
        }
        self.started = true;
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!(
            "MeasurementCycle started in {:?} (sensors 0x{:02x} / 0x{:02x})",
            self.fsm.current_state(),
            self.ctx.sensor(Channel::A).address(),
            self.ctx.sensor(Channel::B).address()
        );
    }

    // ── Per-step orchestration ────────────────────────────────

    /// Advance until the next suspension point.
    ///
    /// Each update either transitions (and the loop continues into the new
    /// state) or suspends (and the call returns).  Events for transitions,
    /// completed configuration, published measurements and stalls are
    /// emitted through `sink` in the order they happen.
    pub fn step_once(&mut self, sink: &mut impl EventSink) -> StepOutcome {
        self.start(sink);
        self.ctx.metrics.steps = self.ctx.metrics.steps.wrapping_add(1);

        let mut outcome = StepOutcome::Suspended;
        for _ in 0..MAX_UPDATES_PER_STEP {
            let taken = self.fsm.tick(&mut self.ctx);

            if let Some(stall) = self.ctx.stall.take() {
                sink.emit(&AppEvent::SensorStalled(stall));
            }

            let Some(transition) = taken else {
                return outcome;
            };
            outcome = StepOutcome::Progressed;
            self.on_transition(transition, sink);
        }
        outcome
    }

    fn on_transition(&mut self, t: Transition, sink: &mut impl EventSink) {
        self.ctx.metrics.transitions = self.ctx.metrics.transitions.wrapping_add(1);
        sink.emit(&AppEvent::StateChanged {
            from: t.from,
            to: t.to,
        });

        match (t.from, t.to) {
            (StateId::InitB, StateId::WaitTrigger) => {
                let calibration = Channel::ALL.map(|ch| *self.ctx.sensor(ch).calibration());
                sink.emit(&AppEvent::Calibrated(calibration));
            }
            (_, StateId::Published) => {
                sink.emit(&AppEvent::MeasurementPublished(MeasurementReport {
                    sequence: self.ctx.metrics.measurements,
                    samples: self.ctx.samples,
                }));
            }
            _ => {}
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Updates run in the current state, including suspended ones.
    pub fn updates_in_state(&self) -> u64 {
        self.fsm.ticks_in_current_state()
    }

    /// Sample published for `channel` by the most recent `Published`.
    pub fn sample(&self, channel: Channel) -> MeasurementSample {
        self.ctx.samples[channel.index()]
    }

    pub fn samples(&self) -> [MeasurementSample; 2] {
        self.ctx.samples
    }

    /// Coefficients for `channel`, or `None` until both sensors have been
    /// configured.
    pub fn calibration(&self, channel: Channel) -> Option<&CalibrationData> {
        self.ctx
            .configured
            .then(|| self.ctx.sensor(channel).calibration())
    }

    pub fn is_configured(&self) -> bool {
        self.ctx.configured
    }

    pub fn metrics(&self) -> &CycleMetrics {
        &self.ctx.metrics
    }

    /// Number of times the shared retry timer has been armed.
    pub fn retry_restarts(&self) -> u32 {
        self.ctx.retry.restarts()
    }

    pub fn sensor(&self, channel: Channel) -> &S {
        self.ctx.sensor(channel)
    }

    pub fn config(&self) -> &CycleConfig {
        &self.ctx.config
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

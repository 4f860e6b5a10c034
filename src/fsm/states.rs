//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.  Handlers are generic over the sensor driver and
//! clock; the table builder instantiates them for one concrete pair.
//!
//! ```text
//!  IDLE ──▶ PING_A ──▶ PING_B ──▶ INIT_A ──▶ INIT_B ──▶ WAIT_TRIGGER ◀──┐
//!            ↺100ms     ↺100ms     ↺100ms     ↺100ms          │          │
//!                                                        [trigger]       │
//!                                                             ▼          │
//!                                               READOUT (A, then B)      │
//!                                                             │          │
//!                                                             ▼          │
//!                                                        PUBLISHED ──────┘
//! ```
//!
//! `↺` marks the shared retry timer: on a `Pending` answer the timer is
//! re-armed and the state suspends until it expires.  Retries are
//! unbounded; a silent device parks the cycle in that state.

use core::task::Poll;

use log::{debug, info, warn};

use super::context::CycleContext;
use super::{StateDescriptor, StateId};
use crate::app::ports::{SensorDriver, TimePort};
use crate::diagnostics::{RetryPhase, StallReport};
use crate::sensors::Channel;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table for one driver/clock pairing.  Called once at
/// cycle construction.
pub fn build_state_table<'h, S: SensorDriver, T: TimePort>()
-> [StateDescriptor<CycleContext<'h, S, T>>; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: None,
            on_exit: None,
            on_update: idle_update::<S, T>,
        },
        // Index 1: PingA
        StateDescriptor {
            id: StateId::PingA,
            name: "PingA",
            on_enter: None,
            on_exit: None,
            on_update: ping_a_update::<S, T>,
        },
        // Index 2: PingB
        StateDescriptor {
            id: StateId::PingB,
            name: "PingB",
            on_enter: None,
            on_exit: None,
            on_update: ping_b_update::<S, T>,
        },
        // Index 3: InitA
        StateDescriptor {
            id: StateId::InitA,
            name: "InitA",
            on_enter: None,
            on_exit: None,
            on_update: init_a_update::<S, T>,
        },
        // Index 4: InitB
        StateDescriptor {
            id: StateId::InitB,
            name: "InitB",
            on_enter: None,
            on_exit: Some(init_b_exit::<S, T>),
            on_update: init_b_update::<S, T>,
        },
        // Index 5: WaitTrigger
        StateDescriptor {
            id: StateId::WaitTrigger,
            name: "WaitTrigger",
            on_enter: Some(wait_trigger_enter::<S, T>),
            on_exit: None,
            on_update: wait_trigger_update::<S, T>,
        },
        // Index 6: Readout
        StateDescriptor {
            id: StateId::Readout,
            name: "Readout",
            on_enter: Some(readout_enter::<S, T>),
            on_exit: None,
            on_update: readout_update::<S, T>,
        },
        // Index 7: Published
        StateDescriptor {
            id: StateId::Published,
            name: "Published",
            on_enter: Some(published_enter::<S, T>),
            on_exit: None,
            on_update: published_update::<S, T>,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared retry step
// ═══════════════════════════════════════════════════════════════════════════

/// One attempt at a polled setup operation with fixed back-off.
///
/// Suspends while the retry timer runs.  Once it has expired, the operation
/// is invoked; `Ready` moves to `next`, `Pending` re-arms the timer.
fn retry_step<S: SensorDriver, T: TimePort>(
    ctx: &mut CycleContext<'_, S, T>,
    channel: Channel,
    phase: RetryPhase,
    next: StateId,
) -> Option<StateId> {
    if !ctx.retry.is_expired() {
        return None;
    }

    let sensor = ctx.sensor_mut(channel);
    let address = sensor.address();
    let poll = match phase {
        RetryPhase::Presence => sensor.presence(),
        RetryPhase::Configure => sensor.configure(),
    };

    match poll {
        Poll::Ready(()) => {
            ctx.metrics.clear_streak();
            info!("sensor {} (0x{:02x}): {} complete", channel, address, phase);
            Some(next)
        }
        Poll::Pending => {
            let interval = ctx.retry_interval();
            ctx.retry.restart(interval);
            let attempts = ctx.metrics.record_retry(channel, phase);
            debug!(
                "sensor {}: {} not ready, retry {} in {}ms",
                channel,
                phase,
                attempts,
                interval.as_millis()
            );

            let every = ctx.config.stall_warn_every;
            if every != 0 && attempts % every == 0 {
                warn!(
                    "sensor {} (0x{:02x}): still no {} after {} attempts",
                    channel, address, phase, attempts
                );
                ctx.stall = Some(StallReport {
                    channel,
                    phase,
                    attempts,
                });
            }
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: constructed, not yet stepped
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update<S: SensorDriver, T: TimePort>(
    ctx: &mut CycleContext<'_, S, T>,
) -> Option<StateId> {
    info!(
        "IDLE: starting discovery of sensors at 0x{:02x} / 0x{:02x}",
        ctx.sensor(Channel::A).address(),
        ctx.sensor(Channel::B).address()
    );
    Some(StateId::PingA)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PING: wait for each device to acknowledge, A fully before B
// ═══════════════════════════════════════════════════════════════════════════

fn ping_a_update<S: SensorDriver, T: TimePort>(
    ctx: &mut CycleContext<'_, S, T>,
) -> Option<StateId> {
    retry_step(ctx, Channel::A, RetryPhase::Presence, StateId::PingB)
}

fn ping_b_update<S: SensorDriver, T: TimePort>(
    ctx: &mut CycleContext<'_, S, T>,
) -> Option<StateId> {
    retry_step(ctx, Channel::B, RetryPhase::Presence, StateId::InitA)
}

// ═══════════════════════════════════════════════════════════════════════════
//  INIT: apply device configuration, same back-off pattern
// ═══════════════════════════════════════════════════════════════════════════

fn init_a_update<S: SensorDriver, T: TimePort>(
    ctx: &mut CycleContext<'_, S, T>,
) -> Option<StateId> {
    retry_step(ctx, Channel::A, RetryPhase::Configure, StateId::InitB)
}

fn init_b_update<S: SensorDriver, T: TimePort>(
    ctx: &mut CycleContext<'_, S, T>,
) -> Option<StateId> {
    retry_step(ctx, Channel::B, RetryPhase::Configure, StateId::WaitTrigger)
}

fn init_b_exit<S: SensorDriver, T: TimePort>(ctx: &mut CycleContext<'_, S, T>) {
    ctx.configured = true;
    info!("INIT: both sensors configured");
    for channel in Channel::ALL {
        debug!(
            "sensor {} calibration: {}",
            channel,
            ctx.sensor(channel).calibration()
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAIT_TRIGGER: idle until the requester asks for a measurement
// ═══════════════════════════════════════════════════════════════════════════

fn wait_trigger_enter<S: SensorDriver, T: TimePort>(_ctx: &mut CycleContext<'_, S, T>) {
    debug!("WAIT_TRIGGER: ready for the next measurement request");
}

fn wait_trigger_update<S: SensorDriver, T: TimePort>(
    ctx: &mut CycleContext<'_, S, T>,
) -> Option<StateId> {
    ctx.handshake.is_triggered().then_some(StateId::Readout)
}

// ═══════════════════════════════════════════════════════════════════════════
//  READOUT: A to completion, then B; never interleaved
// ═══════════════════════════════════════════════════════════════════════════

fn readout_enter<S: SensorDriver, T: TimePort>(ctx: &mut CycleContext<'_, S, T>) {
    ctx.readout_channel = Channel::A;
}

fn readout_update<S: SensorDriver, T: TimePort>(
    ctx: &mut CycleContext<'_, S, T>,
) -> Option<StateId> {
    if ctx.readout_channel == Channel::A {
        if ctx.sensor_mut(Channel::A).readout().is_pending() {
            return None;
        }
        ctx.readout_channel = Channel::B;
    }

    if ctx.sensor_mut(Channel::B).readout().is_pending() {
        return None;
    }
    Some(StateId::Published)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUBLISHED: hand the samples to the requester
// ═══════════════════════════════════════════════════════════════════════════

fn published_enter<S: SensorDriver, T: TimePort>(ctx: &mut CycleContext<'_, S, T>) {
    for channel in Channel::ALL {
        let sample = ctx.sensor(channel).sample();
        ctx.samples[channel.index()] = sample;
        info!(
            "sensor {}: {:.2} C, {:.2} hPa, {:.3} %RH",
            channel,
            sample.celsius(),
            sample.hectopascal(),
            sample.relative_humidity()
        );
    }
    ctx.metrics.measurements = ctx.metrics.measurements.wrapping_add(1);
    ctx.handshake.publish();
}

fn published_update<S: SensorDriver, T: TimePort>(
    _ctx: &mut CycleContext<'_, S, T>,
) -> Option<StateId> {
    Some(StateId::WaitTrigger)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════

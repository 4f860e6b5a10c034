//! Port traits: the boundary between the measurement cycle and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MeasurementCycle (domain)
//! ```
//!
//! Sensors, clocks, event sinks and config storage implement these traits.
//! The [`MeasurementCycle`](super::cycle::MeasurementCycle) consumes them via
//! generics, so the core never touches a bus or a wall clock directly.

use core::task::Poll;

use crate::config::CycleConfig;
use crate::sensors::{BusAddress, CalibrationData, MeasurementSample};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: device → domain)
// ───────────────────────────────────────────────────────────────

/// The three polled operations every sensor must offer.
///
/// Each call does a bounded amount of work and reports `Poll::Pending`
/// ("call again") or `Poll::Ready(())` ("done").  There is no failure
/// variant: an absent or misbehaving device simply never becomes ready.
pub trait SensorDriver {
    /// Bus address this instance was constructed with.
    fn address(&self) -> BusAddress;

    /// Ready once the device acknowledges on the bus.
    fn presence(&mut self) -> Poll<()>;

    /// Ready once device setup has been applied and calibration read.
    /// Only called after [`presence`](Self::presence) has completed.
    fn configure(&mut self) -> Poll<()>;

    /// Ready once a fresh compensated sample is available via
    /// [`sample`](Self::sample).  Only called after
    /// [`configure`](Self::configure) has completed.
    fn readout(&mut self) -> Poll<()>;

    /// Coefficients retrieved during configuration.
    fn calibration(&self) -> &CalibrationData;

    /// Most recent completed sample.
    fn sample(&self) -> MeasurementSample;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait TimePort {
    fn now_ms(&self) -> u64;
}

impl<T: TimePort + ?Sized> TimePort for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The cycle emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists the cycle configuration.
///
/// Implementations validate before persisting and reject out-of-range
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Returns [`CycleConfig::default()`] if nothing has been stored.
    fn load(&self) -> Result<CycleConfig, ConfigError>;

    fn save(&self, config: &CycleConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Callback the [`TriggerScheduler`](crate::scheduler::TriggerScheduler)
/// invokes when a schedule fires.  The scheduler knows nothing about the
/// handshake; the delegate decides what a fire means.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    Periodic,
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations and config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A field failed range validation; the message names it.
    ValidationFailed(&'static str),
    /// The backing store could not be read or written.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

//! Log-based adapters.
//!
//! - [`init_logger`] installs `env_logger` as the host backend.  It writes
//!   to stderr, so stdout stays free for measurement output.
//! - [`LogEventSink`] implements [`EventSink`] by writing structured
//!   application events through the `log` facade.  A telemetry adapter
//!   would implement the same trait.

#[cfg(not(target_os = "espidf"))]
use anyhow::Context;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

// ───────────────────────────────────────────────────────────────
// Logger backend
// ───────────────────────────────────────────────────────────────

/// Install `env_logger` on stderr at `level`.  Fails if another logger
/// has already been set.
#[cfg(not(target_os = "espidf"))]
pub fn init_logger(level: log::LevelFilter) -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .try_init()
        .context("logger init failed")
}

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events written so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Calibrated(calibration) => {
                for (i, cal) in calibration.iter().enumerate() {
                    info!("CALIB | sensor={} | {}", if i == 0 { 'A' } else { 'B' }, cal);
                }
            }
            AppEvent::MeasurementPublished(report) => {
                let [a, b] = report.samples;
                info!(
                    "MEAS  | #{} | A: T={:.2}\u{00b0}C P={:.2}hPa RH={:.3}% | \
                     B: T={:.2}\u{00b0}C P={:.2}hPa RH={:.3}%",
                    report.sequence,
                    a.celsius(),
                    a.hectopascal(),
                    a.relative_humidity(),
                    b.celsius(),
                    b.hectopascal(),
                    b.relative_humidity(),
                );
            }
            AppEvent::SensorStalled(stall) => {
                warn!(
                    "STALL | sensor={} | phase={} | attempts={}",
                    stall.channel, stall.phase, stall.attempts
                );
            }
        }
    }
}

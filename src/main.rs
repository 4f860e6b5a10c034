//! envmon: host simulation entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedBme280 ×2  LogEventSink   JsonConfigFile  Monotonic  │
//! │  (SensorDriver)      (EventSink)    (ConfigPort)    (TimePort) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MeasurementCycle (pure logic)               │    │
//! │  │  FSM · RetryTimer · Handshake responder                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TriggerScheduler (delegate-driven) → Handshake requester      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each published measurement is written to stdout as one JSON line; logs
//! go to stderr.  `ENVMON_CONFIG` names a JSON config file and
//! `ENVMON_MEASUREMENTS` stops the run after that many measurements.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::info;

use envmon::adapters::config_store::JsonConfigFile;
use envmon::adapters::log_sink::{LogEventSink, init_logger};
use envmon::adapters::time::MonotonicClock;
use envmon::app::cycle::MeasurementCycle;
use envmon::app::events::MeasurementReport;
use envmon::app::ports::{ConfigPort, ScheduleFiredKind, SchedulerDelegate, TimePort};
use envmon::config::CycleConfig;
use envmon::handshake::{Handshake, Requester, TriggerAck};
use envmon::scheduler::{Schedule, ScheduleKind, TriggerScheduler};
use envmon::sensors::simulated::{PendingScript, SimulatedBme280};
use envmon::sensors::{Channel, MeasurementSample, SensorData};

/// Environment variable limiting the number of measurements.
const MEASUREMENTS_ENV_VAR: &str = "ENVMON_MEASUREMENTS";

// ── Scheduler delegate ────────────────────────────────────────

/// Turns schedule fires into measurement requests.
struct TriggerDelegate<'h> {
    requester: Requester<'h>,
}

impl SchedulerDelegate for TriggerDelegate<'_> {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind) {
        match self.requester.trigger_measurement() {
            TriggerAck::Accepted => info!("Schedule fired: '{}' ({:?})", label, kind),
            TriggerAck::AlreadyPending => {
                info!("Schedule fired: '{}' ({:?}), request already pending", label, kind);
            }
        }
    }
}

// ── Setup helpers ─────────────────────────────────────────────

fn load_config(file: Option<&JsonConfigFile>) -> Result<CycleConfig> {
    match file {
        Some(file) => file
            .load()
            .with_context(|| format!("loading config from {}", file.path().display())),
        None => Ok(CycleConfig::default()),
    }
}

fn measurement_limit() -> Result<Option<u32>> {
    std::env::var(MEASUREMENTS_ENV_VAR)
        .ok()
        .map(|raw| parse_limit(&raw))
        .transpose()
}

/// Parse a measurement limit.  Zero is rejected.
fn parse_limit(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(anyhow!(
            "{} must be a positive integer, got '{}'",
            MEASUREMENTS_ENV_VAR,
            raw
        )),
    }
}

/// Two sensors that take a few polls to come up, with different baselines
/// so their readings are told apart in the output.
fn simulated_sensors(config: &CycleConfig) -> (SimulatedBme280, SimulatedBme280) {
    let a = SimulatedBme280::new(SensorData::default(), config.address(Channel::A)).with_script(
        PendingScript {
            presence: 2,
            configure: 1,
            readout: 1,
        },
    );
    let b = SimulatedBme280::new(SensorData::default(), config.address(Channel::B))
        .with_script(PendingScript {
            presence: 3,
            configure: 2,
            readout: 2,
        })
        .with_baseline(MeasurementSample {
            temperature: 2230,
            pressure: 101_290_000,
            humidity: 47_500,
        });
    (a, b)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Configuration ──────────────────────────────────────
    let config_file = JsonConfigFile::from_env();
    let config = load_config(config_file.as_ref())?;
    let level = config
        .log_filter()
        .ok_or_else(|| anyhow!("unknown log level '{}'", config.log_level))?;
    let limit = measurement_limit()?;

    // ── 2. Logging ────────────────────────────────────────────
    init_logger(level)?;

    info!("╔══════════════════════════════════════╗");
    info!("║  envmon v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    match &config_file {
        Some(file) => info!("Config loaded from {}", file.path().display()),
        None => info!("No config file set, using defaults"),
    }

    // ── 3. Adapters ───────────────────────────────────────────
    let clock = MonotonicClock::new();
    let (sensor_a, sensor_b) = simulated_sensors(&config);
    let mut log_sink = LogEventSink::new();

    let mut handshake = Handshake::new();
    let (requester, responder) = handshake.split();
    let mut delegate = TriggerDelegate { requester };

    let mut sched = TriggerScheduler::new();
    sched.add(Schedule {
        label: "first-measurement",
        kind: ScheduleKind::OneShot { delay_ms: 0 },
        enabled: true,
    });
    sched.add(Schedule {
        label: "periodic-measurement",
        kind: ScheduleKind::Periodic {
            interval_ms: config.trigger_interval_ms,
        },
        enabled: true,
    });

    // ── 4. Measurement cycle ──────────────────────────────────
    let mut cycle = MeasurementCycle::new(sensor_a, sensor_b, clock, responder, config);
    cycle.start(&mut log_sink);

    info!("System ready. Entering main loop.");

    // ── 5. Cooperative loop ───────────────────────────────────
    let step_interval = Duration::from_millis(u64::from(cycle.config().step_interval_ms));
    loop {
        sched.tick(clock.now_ms(), &mut delegate);
        cycle.step_once(&mut log_sink);

        if delegate.requester.take_new_data() {
            let report = MeasurementReport {
                sequence: cycle.metrics().measurements,
                samples: cycle.samples(),
            };
            let line =
                serde_json::to_string(&report).map_err(|e| anyhow!("encoding report: {}", e))?;
            println!("{}", line);

            if limit.is_some_and(|n| report.sequence >= n) {
                break;
            }
        }

        std::thread::sleep(step_interval);
    }

    let m = cycle.metrics();
    info!(
        "Done: {} measurements, {} steps, {} transitions, {} retries, {} events",
        m.measurements,
        m.steps,
        m.transitions,
        m.total_retries(),
        log_sink.emitted()
    );
    Ok(())
}

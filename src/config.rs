//! Measurement cycle configuration
//!
//! All tunable parameters for the dual-sensor cycle and its host runtime.
//! Values can be overridden from a JSON file or a [`ConfigPort`] store.
//!
//! [`ConfigPort`]: crate::app::ports::ConfigPort

use core::str::FromStr;
use core::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::{BusAddress, Channel, DEFAULT_ADDRESS};

/// Back-off between presence/configuration attempts.
pub const DEFAULT_RETRY_INTERVAL_MS: u32 = 100;

/// Core cycle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    // --- Sensors ---
    /// Bus address of sensor A
    pub sensor_a_address: BusAddress,
    /// Bus address of sensor B (same address, separate bus segment)
    pub sensor_b_address: BusAddress,

    // --- Retry ---
    /// Delay between presence/configure attempts (milliseconds)
    pub retry_interval_ms: u32,
    /// Warn after this many consecutive retries in one state (0 = never)
    pub stall_warn_every: u32,

    // --- Host runtime ---
    /// Periodic measurement trigger interval (milliseconds)
    pub trigger_interval_ms: u32,
    /// Cooperative scheduler tick (milliseconds)
    pub step_interval_ms: u32,
    /// Log level name: off, error, warn, info, debug, trace
    pub log_level: heapless::String<8>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        let mut log_level = heapless::String::new();
        let _ = log_level.push_str("info");
        Self {
            sensor_a_address: DEFAULT_ADDRESS,
            sensor_b_address: DEFAULT_ADDRESS,

            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            stall_warn_every: 50, // 5 s at the default back-off

            trigger_interval_ms: 1000,
            step_interval_ms: 10,
            log_level,
        }
    }
}

impl CycleConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.retry_interval_ms))
    }

    pub fn address(&self, channel: Channel) -> BusAddress {
        match channel {
            Channel::A => self.sensor_a_address,
            Channel::B => self.sensor_b_address,
        }
    }

    /// Parsed `log_level`, or `None` if the name is not recognised.
    pub fn log_filter(&self) -> Option<LevelFilter> {
        LevelFilter::from_str(&self.log_level).ok()
    }
}

/// Range-check every field.  Used by all [`ConfigPort`] adapters before
/// persisting and after loading.
///
/// [`ConfigPort`]: crate::app::ports::ConfigPort
pub fn validate_config(cfg: &CycleConfig) -> Result<(), ConfigError> {
    for address in [cfg.sensor_a_address, cfg.sensor_b_address] {
        if !(0x08..=0x77).contains(&address) {
            return Err(ConfigError::ValidationFailed(
                "sensor addresses must be 0x08–0x77",
            ));
        }
    }
    if !(10..=10_000).contains(&cfg.retry_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "retry_interval_ms must be 10–10000",
        ));
    }
    if cfg.stall_warn_every > 100_000 {
        return Err(ConfigError::ValidationFailed(
            "stall_warn_every must be 0–100000",
        ));
    }
    if !(100..=3_600_000).contains(&cfg.trigger_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "trigger_interval_ms must be 100–3600000",
        ));
    }
    if !(1..=1000).contains(&cfg.step_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "step_interval_ms must be 1–1000",
        ));
    }
    if cfg.step_interval_ms > cfg.retry_interval_ms {
        return Err(ConfigError::ValidationFailed(
            "step_interval_ms must not exceed retry_interval_ms",
        ));
    }
    if cfg.log_filter().is_none() {
        return Err(ConfigError::ValidationFailed(
            "log_level must be off, error, warn, info, debug or trace",
        ));
    }
    Ok(())
}

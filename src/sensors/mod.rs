//! Sensor data model and driver implementations.
//!
//! The measurement cycle treats each sensor as an opaque
//! [`SensorDriver`](crate::app::ports::SensorDriver).  This module holds the
//! values a driver hands back ([`CalibrationData`], [`MeasurementSample`]),
//! the buffer a driver is built around ([`SensorData`]), and the scripted
//! host-side stand-in used by the simulator binary and the tests.

pub mod simulated;

use core::fmt;

use serde::Serialize;

/// 7-bit bus address of one sensor instance.
pub type BusAddress = embedded_hal::i2c::SevenBitAddress;

/// BME280 address with SDO tied to ground.
pub const DEFAULT_ADDRESS: BusAddress = 0x76;

/// Which of the two sensors an operation or value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Channel {
    A = 0,
    B = 1,
}

impl Channel {
    /// Both channels, in the order the cycle services them.
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    /// Array index for per-channel storage.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Factory trimming coefficients, read once after configuration succeeds.
///
/// Stored widened to `i32` regardless of the on-chip register width so the
/// cycle never needs to know which coefficient is unsigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalibrationData {
    /// T1..T3
    pub temperature: [i32; 3],
    /// P1..P9
    pub pressure: [i32; 9],
    /// H1..H6
    pub humidity: [i32; 6],
}

impl fmt::Display for CalibrationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: [(char, &[i32]); 3] = [
            ('T', &self.temperature),
            ('P', &self.pressure),
            ('H', &self.humidity),
        ];
        let mut first = true;
        for (prefix, values) in groups {
            for (i, value) in values.iter().enumerate() {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{}{}={}", prefix, i + 1, value)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// One compensated reading.  Overwritten on every readout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MeasurementSample {
    /// Hundredths of a degree Celsius.
    pub temperature: i32,
    /// Milli-pascal.
    pub pressure: i32,
    /// Thousandths of a percent relative humidity.
    pub humidity: i32,
}

impl MeasurementSample {
    pub fn celsius(&self) -> f32 {
        self.temperature as f32 / 100.0
    }

    pub fn hectopascal(&self) -> f32 {
        self.pressure as f32 / 100_000.0
    }

    pub fn relative_humidity(&self) -> f32 {
        self.humidity as f32 / 1000.0
    }
}

/// Storage a driver is constructed around: the calibration it fills once
/// and the sample it rewrites on every readout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorData {
    pub calibration: CalibrationData,
    pub sample: MeasurementSample,
}

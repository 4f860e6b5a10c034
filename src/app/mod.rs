//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the measurement cycle that drives both sensors and
//! the events it reports.  All interaction with devices, clocks and storage
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod cycle;
pub mod events;
pub mod ports;

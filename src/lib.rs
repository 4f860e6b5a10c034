//! envmon library.
//!
//! Cooperative discovery, configuration and on-demand measurement of two
//! BME280-class sensors.  The core ([`app`], [`fsm`], [`handshake`],
//! [`retry_timer`]) is pure logic behind port traits; [`adapters`],
//! [`scheduler`] and [`sensors::simulated`] are the host-side pieces used
//! by the binary and the tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod fsm;
pub mod handshake;
pub mod retry_timer;
pub mod scheduler;
pub mod sensors;

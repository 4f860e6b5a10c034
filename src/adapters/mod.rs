//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `config_store` | ConfigPort         | postcard blob / JSON file|
//! | `log_sink`     | EventSink          | `log` facade, stderr     |
//! | `time`         | TimePort           | `Instant` / manual clock |
//!
//! Sensor drivers live in [`crate::sensors`].

pub mod config_store;
pub mod log_sink;
pub mod time;

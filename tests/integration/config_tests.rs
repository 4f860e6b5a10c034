//! Integration tests for configuration → cycle behaviour.
//!
//! Configs come in through the same paths the binary uses (JSON text and
//! the postcard-backed store) and are then observed through the cycle.

use envmon::adapters::config_store::MemoryConfigStore;
use envmon::adapters::time::ManualClock;
use envmon::app::events::AppEvent;
use envmon::app::ports::{ConfigError, ConfigPort};
use envmon::config::{CycleConfig, validate_config};
use envmon::fsm::StateId;
use envmon::handshake::Handshake;
use envmon::sensors::Channel;

use crate::mock_hw::{RecordingSink, Script, rig};

#[test]
fn retry_interval_from_json_sets_back_off() {
    let config: CycleConfig = serde_json::from_str(r#"{ "retry_interval_ms": 250 }"#).unwrap();
    validate_config(&config).unwrap();

    let mut hs = Handshake::new();
    let (_req, resp) = hs.split();
    let clock = ManualClock::new();
    let a = Script {
        presence: 1,
        ..Default::default()
    };
    let (mut cycle, log) = rig(resp, &clock, a, Script::default(), config);
    let mut sink = RecordingSink::new();

    cycle.step_once(&mut sink);
    assert_eq!(log.borrow().len(), 1);

    clock.advance_ms(249);
    cycle.step_once(&mut sink);
    assert_eq!(log.borrow().len(), 1, "still backing off");

    clock.advance_ms(1);
    cycle.step_once(&mut sink);
    assert_eq!(cycle.state(), StateId::WaitTrigger);
}

#[test]
fn stall_reports_can_be_disabled() {
    let config = CycleConfig {
        stall_warn_every: 0,
        ..Default::default()
    };
    let mut hs = Handshake::new();
    let (_req, resp) = hs.split();
    let clock = ManualClock::new();
    let b = Script {
        configure: u32::MAX,
        ..Default::default()
    };
    let (mut cycle, _log) = rig(resp, &clock, Script::default(), b, config);
    let mut sink = RecordingSink::new();

    for _ in 0..200 {
        cycle.step_once(&mut sink);
        clock.advance_ms(100);
    }
    assert_eq!(cycle.state(), StateId::InitB);
    assert_eq!(cycle.metrics().configure_retries, [0, 200]);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorStalled(_))), 0);
}

#[test]
fn stored_addresses_reach_the_sensors() {
    let store = MemoryConfigStore::new();
    let saved = CycleConfig {
        sensor_a_address: 0x76,
        sensor_b_address: 0x77,
        ..Default::default()
    };
    store.save(&saved).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, saved);

    assert_eq!(loaded.address(Channel::A), 0x76);
    assert_eq!(loaded.address(Channel::B), 0x77);
}

#[test]
fn invalid_config_never_reaches_the_store() {
    let store = MemoryConfigStore::new();
    let bad = CycleConfig {
        step_interval_ms: 500,
        retry_interval_ms: 100,
        ..Default::default()
    };
    assert!(matches!(
        store.save(&bad),
        Err(ConfigError::ValidationFailed(_))
    ));
    assert_eq!(store.load().unwrap(), CycleConfig::default());
}

#[test]
fn cycle_exposes_its_config() {
    let config = CycleConfig {
        trigger_interval_ms: 2_000,
        ..Default::default()
    };
    let mut hs = Handshake::new();
    let (_req, resp) = hs.split();
    let clock = ManualClock::new();
    let (cycle, _log) = rig(
        resp,
        &clock,
        Script::default(),
        Script::default(),
        config.clone(),
    );
    assert_eq!(cycle.config(), &config);
    assert_eq!(cycle.state(), StateId::Idle);
}

//! Tests for configuration validation

use std::time::Duration;

use stress_scheduler::config::{
    CyclicPoolConfig, LoadGateConfig, ScenarioConfig, DEFAULT_STOP_MARGIN_MS,
};

#[test]
fn test_scenario_from_json_defaults() {
    let cfg = ScenarioConfig::from_json_str(r#"{ "count": 8 }"#).unwrap();
    assert_eq!(cfg.count, 8);
    assert_eq!(cfg.ramp_up, 0);
    assert_eq!(cfg.stop_margin_ms, DEFAULT_STOP_MARGIN_MS);
    assert_eq!(cfg.load_gate, LoadGateConfig::default());
    assert!(cfg.max_time().is_none());
    assert!(cfg.provision_command.is_empty());
}

#[test]
fn test_scenario_from_json_full() {
    let cfg = ScenarioConfig::from_json_str(
        r#"{
            "count": 20,
            "ramp_up": 5,
            "max_time_secs": 600,
            "profile_relays": true,
            "stop_margin_ms": 500,
            "load_gate": { "interval_secs": 30, "one_min_ceiling": 0.5 },
            "provision_command": ["python3", "dpm.py", "--init"]
        }"#,
    )
    .unwrap();
    let ramp = cfg.ramp_up_config().unwrap();
    assert_eq!(ramp.interval, Duration::from_secs(30));
    assert!((ramp.one_min_ceiling - 0.5).abs() < f64::EPSILON);
    assert!((ramp.five_min_ceiling - 0.80).abs() < f64::EPSILON);
    assert_eq!(ramp.initial_slots, 5);
    assert_eq!(ramp.max_slots, Some(20));
    assert_eq!(cfg.max_time(), Some(Duration::from_secs(600)));
    for pool in cfg.pool_configs() {
        assert_eq!(pool.stop_margin(), Duration::from_millis(500));
        assert_eq!(pool.initial_slots, 5);
    }
}

#[test]
fn test_scenario_rejects_bad_json() {
    assert!(ScenarioConfig::from_json_str("{ count: 1 }").is_err());
    assert!(ScenarioConfig::from_json_str(r#"{ "ramp_up": 1 }"#).is_err());
}

#[test]
fn test_scenario_rejects_increment_above_max() {
    assert!(ScenarioConfig::from_json_str(r#"{ "count": 2, "ramp_up": 3 }"#).is_err());
}

#[test]
fn test_scenario_rejects_zero_interval() {
    let json = r#"{ "count": 2, "ramp_up": 1, "load_gate": { "interval_secs": 0 } }"#;
    assert!(ScenarioConfig::from_json_str(json).is_err());
}

#[test]
fn test_explicit_pools_replace_presets() {
    let cfg = ScenarioConfig::from_json_str(
        r#"{
            "count": 1,
            "dummy": true,
            "pools": [
                {
                    "name": "fast", "initial_slots": 4,
                    "min_duration_secs": 1, "max_duration_secs": 2
                },
                {
                    "name": "slow", "initial_slots": 1,
                    "min_duration_secs": 60, "max_duration_secs": 90, "kill_chance": 0.25
                }
            ]
        }"#,
    )
    .unwrap();
    let pools = cfg.pool_configs();
    assert_eq!(pools.len(), 2);
    assert_eq!(pools[0].first_slot, 1);
    assert_eq!(pools[1].kill_chance, 0.25);
}

#[test]
fn test_explicit_pool_is_validated() {
    let json = r#"{
        "count": 1,
        "pools": [{
            "name": "bad", "initial_slots": 1,
            "min_duration_secs": 9, "max_duration_secs": 3
        }]
    }"#;
    assert!(ScenarioConfig::from_json_str(json).is_err());
}

#[test]
fn test_pool_presets_match_workloads() {
    let publisher = CyclicPoolConfig::publisher(1);
    assert_eq!((publisher.min_duration_secs, publisher.max_duration_secs), (100, 500));
    assert_eq!(publisher.kill_chance, 0.1);
    let subscriber = CyclicPoolConfig::subscriber(1);
    assert_eq!((subscriber.min_duration_secs, subscriber.max_duration_secs), (2, 10));
    assert_eq!(subscriber.kill_chance, 0.5);
    let dummy = CyclicPoolConfig::dummy(1);
    assert_eq!((dummy.min_start_secs, dummy.max_start_secs), (1, 5));
    assert_eq!((dummy.min_duration_secs, dummy.max_duration_secs), (1, 10));
}

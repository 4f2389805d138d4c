//! Tests for builder modules

use std::sync::Arc;

use stress_scheduler::builders::{build_scenario, open_load_log, LoadGateParts};
use stress_scheduler::config::{LoadGateConfig, ScenarioConfig, StressEnvironment};
use stress_scheduler::core::StressError;
use stress_scheduler::infra::FixedLoad;
use stress_scheduler::policy::LoadSample;

fn env() -> Arc<StressEnvironment> {
    Arc::new(StressEnvironment::new("/opt/dds", |_| None).without_artifact_checks())
}

fn idle(_: &LoadGateConfig) -> Result<LoadGateParts, StressError> {
    Ok((
        Box::new(FixedLoad(LoadSample::per_core([0.0; 3], 1))),
        Box::new(std::io::sink()),
    ))
}

#[test]
fn test_dummy_scenario_has_one_pool() {
    let mut cfg = ScenarioConfig::new(3);
    cfg.dummy = true;
    let scenario = build_scenario(&cfg, env(), Some(7), idle).unwrap();
    assert_eq!(scenario.pools.len(), 1);
    // pool, monitor, two relays
    assert_eq!(scenario.policies.len(), 4);
    assert!(scenario.ramp_up.is_none());
}

#[test]
fn test_invalid_scenario_rejected() {
    let cfg = ScenarioConfig::new(0);
    assert!(matches!(
        build_scenario(&cfg, env(), None, idle),
        Err(StressError::InvalidConfig(_))
    ));
}

#[test]
fn test_environment_without_relays_rejected() {
    let mut environment = StressEnvironment::new("/opt/dds", |_| None);
    environment.relays.clear();
    let cfg = ScenarioConfig::new(1);
    assert!(build_scenario(&cfg, Arc::new(environment), None, idle).is_err());
}

#[test]
fn test_load_log_truncates_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("load.csv");
    std::fs::write(&path, "stale\nrows\n").unwrap();
    drop(open_load_log(&path).unwrap());
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("elapsed_seconds,"));
}

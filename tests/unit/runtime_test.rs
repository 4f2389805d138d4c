//! Tests for the scenario driver

use std::sync::Arc;
use std::time::Duration;

use stress_scheduler::config::CyclicPoolConfig;
use stress_scheduler::core::{EventLoop, LoopExit, ProcessGroupManager};
use stress_scheduler::infra::RecordingLauncher;
use stress_scheduler::policy::{CyclicPoolPolicy, SchedulingPolicy, Workload};
use stress_scheduler::runtime::{run_provisioning, run_scenario};
use stress_scheduler::util::{SimulatedClock, StdRandom};

#[test]
fn test_run_until_deadline_then_cleanup() {
    let launcher = Arc::new(RecordingLauncher::new());
    let manager = ProcessGroupManager::new(launcher.clone());
    let pool = CyclicPoolPolicy::new(
        CyclicPoolConfig::new("sleepers", 4, 50, 60),
        Workload::Sleeper,
        StdRandom::seeded(1),
    )
    .unwrap();
    let policies: Vec<Box<dyn SchedulingPolicy>> = vec![Box::new(pool.clone())];
    let mut el = EventLoop::new(SimulatedClock::new());

    let exit = run_scenario(&policies, &mut el, &manager, Some(Duration::from_secs(10))).unwrap();
    assert_eq!(exit, LoopExit::Deadline);
    assert_eq!(pool.running_count(), 4);
    assert_eq!(launcher.spawned().len(), 4);
    // leftovers interrupted once each on the way out
    assert_eq!(launcher.signals().len(), 4);
    assert_eq!(manager.tracked_count(), 0);
}

#[test]
fn test_provisioning_passes_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("provisioned");
    let cmd = vec![
        "touch".to_string(),
        marker.to_string_lossy().into_owned(),
    ];
    run_provisioning(&cmd).unwrap();
    assert!(marker.exists());
}

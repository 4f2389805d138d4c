//! Tests for error types

use std::path::PathBuf;

use stress_scheduler::core::StressError;

#[test]
fn test_invalid_config_error() {
    let err = StressError::InvalidConfig("count must be greater than 0".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: count must be greater than 0");
}

#[test]
fn test_missing_artifact_error() {
    let err = StressError::MissingArtifact(PathBuf::from("./DPM/ca/identity/cert.pem"));
    assert_eq!(format!("{}", err), "missing artifact: ./DPM/ca/identity/cert.pem");
}

#[test]
fn test_spawn_error_keeps_source() {
    let err = StressError::Spawn {
        nick: "relay-1".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    };
    assert_eq!(format!("{}", err), "failed to spawn `relay-1`: no such file");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_signal_error() {
    let err = StressError::Signal {
        pid: 77,
        reason: "EPERM".to_string(),
    };
    assert_eq!(format!("{}", err), "failed to signal process group of 77: EPERM");
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "load.csv");
    let err: StressError = io.into();
    assert!(matches!(err, StressError::Io(_)));
}

#[test]
fn test_errors_convert_to_anyhow() {
    let result: stress_scheduler::core::AppResult<()> =
        Err(StressError::LoadAverage("unsupported".to_string()).into());
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "load average unavailable: unsupported");
}

//! Long-lived support processes started once: relays and the monitor.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{RelayEndpoint, StressEnvironment};
use crate::core::{EventLoop, LaunchSpec, ProcessGroupManager, StressError};
use crate::policy::oneshot::{OneShotPolicy, OneShotTask, Rearm};

/// Starts one support process and never stops it; cleanup does.
#[derive(Debug, Clone)]
pub struct Infrastructure {
    spec: LaunchSpec,
    required: Vec<PathBuf>,
    launched: Option<u32>,
}

impl Infrastructure {
    /// Launch `spec` as-is.
    pub fn new(spec: LaunchSpec) -> Self {
        Self {
            spec,
            required: Vec::new(),
            launched: None,
        }
    }

    /// Refuse to launch unless `paths` exist.
    #[must_use]
    pub fn requiring(mut self, paths: Vec<PathBuf>) -> Self {
        self.required = paths;
        self
    }

    /// Relay `endpoint`, optionally under the mutrace lock profiler.
    pub fn relay(endpoint: &RelayEndpoint, env: &StressEnvironment, profile: bool) -> Self {
        let id = endpoint.id;
        let identity = format!("relay_{id}");
        let a = &env.artifacts;
        let log_path = format!("relay_{id}.log");
        let relay = env.relay_program().to_string_lossy().into_owned();

        let mut args: Vec<String> = Vec::new();
        let program = if profile {
            args.push("--hash-size=337337".into());
            args.push(relay);
            "mutrace".to_string()
        } else {
            relay
        };
        let path = |p: PathBuf| p.to_string_lossy().into_owned();
        args.extend([
            "-RunTime".into(),
            "60".into(),
            "-HandlerThreads".into(),
            "2".into(),
            "-DCPSConfigFile".into(),
            format!("stress_relay_{id}.ini"),
            "-ORBVerboseLogging".into(),
            "1".into(),
            "-ApplicationDomain".into(),
            "42".into(),
            "-RelayDomain".into(),
            "0".into(),
            "-IdentityCA".into(),
            path(a.identity_ca()),
            "-PermissionsCA".into(),
            path(a.permissions_ca()),
            "-IdentityCertificate".into(),
            path(a.identity_cert(&identity)),
            "-IdentityKey".into(),
            path(a.identity_key(&identity)),
            "-Governance".into(),
            path(a.governance()),
            "-Permissions".into(),
            path(a.permissions(&identity)),
            "-DCPSSecurity".into(),
            "1".into(),
            "-UserData".into(),
            format!("relay{id}"),
            "-VerticalAddress".into(),
            endpoint.vertical_address.clone(),
            "-HorizontalAddress".into(),
            endpoint.horizontal_address.clone(),
            "-MetaDiscoveryAddress".into(),
            endpoint.meta_discovery_address.clone(),
        ]);
        for (flag, value) in [
            ("-LogDiscovery", "1"),
            ("-LogActivity", "1"),
            ("-LogRelayStatistics", "300"),
            ("-Lifespan", "300"),
        ] {
            args.push(flag.into());
            args.push(value.into());
        }
        args.push("-Id".into());
        args.push(format!("relay{id}"));
        for (flag, value) in [
            ("-PublishRelayStatus", "10"),
            ("-PublishRelayStatusLiveliness", "30"),
            ("-RestartDetection", "1"),
            ("-LogThreadStatus", "0"),
            ("-AdmissionControlQueueSize", "10"),
            ("-AdmissionControlQueueDuration", "5"),
            ("-AdmissionMaxParticipantsRange", "9500-10000"),
            ("-LogUtilizationChanges", "1"),
        ] {
            args.push(flag.into());
            args.push(value.into());
        }
        args.push("-ORBLogFile".into());
        args.push(log_path.clone());

        let nick = format!("relay-{id}");
        let mut spec = LaunchSpec::new(nick.clone(), program)
            .with_args(args)
            .with_env(env.child_env.iter().cloned())
            .with_fresh_log(log_path);
        if profile {
            spec = spec.with_stderr_to(format!("{nick}.stderr.txt"));
        }

        let mut required = a.shared();
        required.extend(a.identity(&identity));
        let required = if env.verify_artifacts { required } else { Vec::new() };
        Self::new(spec).requiring(required)
    }

    /// The relay monitor.
    pub fn monitor(env: &StressEnvironment) -> Self {
        let log_path = "monitor.log";
        let spec = LaunchSpec::new("monitor", "./monitor")
            .with_args([
                "-DCPSConfigFile",
                "monitor.ini",
                "-DCPSDebugLevel",
                "1",
                "-ORBVerboseLogging",
                "1",
                "-DCPSTransportDebugLevel",
                "1",
                "-ORBLogFile",
                log_path,
                "-DCPSPendingTimeout",
                "3",
            ])
            .with_env(env.child_env.iter().cloned())
            .with_fresh_log(log_path);
        Self::new(spec)
    }

    /// Launch specification.
    pub const fn spec(&self) -> &LaunchSpec {
        &self.spec
    }

    /// Pid of the launched process, once started.
    pub const fn launched(&self) -> Option<u32> {
        self.launched
    }
}

impl OneShotTask for Infrastructure {
    fn label(&self) -> String {
        format!("START {}", self.spec.nick)
    }

    fn fire(
        &mut self,
        _: &mut EventLoop,
        manager: &ProcessGroupManager,
    ) -> Result<Rearm, StressError> {
        crate::config::require_files(&self.required)?;
        let tracked = manager.run(&self.spec)?;
        self.launched = Some(tracked.pid);
        Ok(Rearm::Done)
    }
}

impl OneShotPolicy<Infrastructure> {
    /// Start `task` as soon as the loop runs.
    pub fn immediately(task: Infrastructure) -> Self {
        Self::new(Duration::ZERO, task)
    }
}

//! Launch strategies for cyclic pools.

use std::fmt;
use std::sync::Arc;

use crate::config::StressEnvironment;
use crate::core::{LaunchSpec, StressError};
use crate::util::random::RandomSource;

/// Which side of a publisher/subscriber pair a participant plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantRole {
    /// Writes samples.
    Publisher,
    /// Reads samples.
    Subscriber,
}

impl ParticipantRole {
    /// Lowercase role name; doubles as executable and identity prefix.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publisher => "publisher",
            Self::Subscriber => "subscriber",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a cyclic pool launches for each slot.
#[derive(Debug, Clone)]
pub enum Workload {
    /// `sleep` in a loop; exercises scheduling without any middleware.
    Sleeper,
    /// Secure DDS participant connected through a randomly chosen relay.
    Participant {
        /// Publisher or subscriber.
        role: ParticipantRole,
        /// Shared launch environment.
        env: Arc<StressEnvironment>,
    },
}

impl Workload {
    /// Participant workload for `role`.
    pub const fn participant(role: ParticipantRole, env: Arc<StressEnvironment>) -> Self {
        Self::Participant { role, env }
    }

    /// Build the command for run `run` of `slot`.
    ///
    /// Participants log to `<role>_<slot>.log`, cleared on the slot's first
    /// run, and need their identity artifacts on disk.
    pub fn launch_spec(
        &self,
        slot: u64,
        run: u32,
        rng: &mut dyn RandomSource,
    ) -> Result<LaunchSpec, StressError> {
        match self {
            Self::Sleeper => Ok(LaunchSpec::new(format!("dummy-{slot}-{run}"), "/usr/bin/env")
                .with_args(["sleep", "1000000"])),
            Self::Participant { role, env } => participant_spec(*role, env, slot, run, rng),
        }
    }
}

fn file_arg(path: &std::path::Path) -> String {
    format!("file:{}", path.display())
}

fn participant_spec(
    role: ParticipantRole,
    env: &StressEnvironment,
    slot: u64,
    run: u32,
    rng: &mut dyn RandomSource,
) -> Result<LaunchSpec, StressError> {
    let identity = format!("{role}_{slot}");
    let artifacts = &env.artifacts;
    env.require(&artifacts.shared())?;
    env.require(&artifacts.identity(&identity))?;

    let relay = env
        .relays
        .get(rng.pick(env.relays.len().max(1)))
        .ok_or_else(|| StressError::InvalidConfig("no relays configured".into()))?;
    let log_path = format!("{role}_{slot}.log");

    let mut spec = LaunchSpec::new(format!("{role}-{slot}-{run}"), format!("./{role}"))
        .with_args([
            "-OpenDDSAuthIdentityCA".to_string(),
            file_arg(&artifacts.identity_ca()),
            "-OpenDDSAuthIdentityCertificate".to_string(),
            file_arg(&artifacts.identity_cert(&identity)),
            "-OpenDDSAuthPrivateKey".to_string(),
            file_arg(&artifacts.identity_key(&identity)),
            "-OpenDDSAccessPermissionsCA".to_string(),
            file_arg(&artifacts.permissions_ca()),
            "-OpenDDSAccessGovernance".to_string(),
            file_arg(&artifacts.governance()),
            "-OpenDDSAccessPermissions".to_string(),
            file_arg(&artifacts.permissions(&identity)),
            "-DCPSSecurity".to_string(),
            "1".to_string(),
        ])
        .with_args([
            "-DCPSConfigFile".to_string(),
            relay.participant_config(),
            "-ORBDebugLevel".to_string(),
            "1".to_string(),
            "-DCPSDebugLevel".to_string(),
            "1".to_string(),
            "-ORBVerboseLogging".to_string(),
            "1".to_string(),
            "-DCPSTransportDebugLevel".to_string(),
            "1".to_string(),
            "-ORBLogFile".to_string(),
            log_path.clone(),
            "-DCPSPendingTimeout".to_string(),
            "3".to_string(),
            "-s".to_string(),
            "-p".to_string(),
            slot.to_string(),
        ])
        .with_env(env.child_env.iter().cloned());
    if run == 1 {
        spec = spec.with_fresh_log(log_path);
    }
    Ok(spec)
}

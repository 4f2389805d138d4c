//! Builds the policy set of a scenario from configuration.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CyclicPoolConfig, LoadGateConfig, ScenarioConfig, StressEnvironment};
use crate::core::StressError;
use crate::infra::SystemLoad;
use crate::policy::{
    CyclicPoolPolicy, Infrastructure, InfrastructurePolicy, LoadAdaptive, LoadAdaptivePolicy,
    LoadSource, ParticipantRole, SchedulingPolicy, TerminationPolicy, Workload, LOAD_CSV_HEADER,
};
use crate::util::random::StdRandom;

/// Load source and CSV sink handed to the ramp-up policy.
pub type LoadGateParts = (Box<dyn LoadSource>, Box<dyn Write>);

/// Everything the driver readies, in order.
pub struct Scenario {
    /// Cyclic pools, also present in `policies`.
    pub pools: Vec<CyclicPoolPolicy>,
    /// Ramp-up policy when enabled, also present in `policies`.
    pub ramp_up: Option<LoadAdaptivePolicy>,
    /// Every policy: pools, monitor, relays, termination, ramp-up.
    pub policies: Vec<Box<dyn SchedulingPolicy>>,
}

/// Open `path` as a fresh load log and write the header row.
pub fn open_load_log(path: &Path) -> Result<Box<dyn Write>, StressError> {
    let mut log = BufWriter::new(File::create(path)?);
    writeln!(log, "{LOAD_CSV_HEADER}")?;
    log.flush()?;
    Ok(Box::new(log))
}

/// Host load average and a CSV file at the configured path.
pub fn system_load_gate(gate: &LoadGateConfig) -> Result<LoadGateParts, StressError> {
    Ok((Box::new(SystemLoad::new()), open_load_log(&gate.csv_path)?))
}

fn workload_for(
    cfg: &ScenarioConfig,
    pool: &CyclicPoolConfig,
    env: &Arc<StressEnvironment>,
) -> Result<Workload, StressError> {
    if cfg.dummy {
        return Ok(Workload::Sleeper);
    }
    let role = if pool.name.starts_with("publisher") {
        ParticipantRole::Publisher
    } else if pool.name.starts_with("subscriber") {
        ParticipantRole::Subscriber
    } else {
        return Err(StressError::InvalidConfig(format!(
            "pool `{}` names no participant role; prefix it with publisher or subscriber",
            pool.name
        )));
    };
    Ok(Workload::participant(role, Arc::clone(env)))
}

/// Build the policies of `cfg`.
///
/// With `seed`, pool `i` draws from a generator seeded with `seed + i`, so
/// a scenario replays identically; otherwise each pool is seeded by the OS.
/// `load_gate` is only called when ramp-up is enabled.
pub fn build_scenario<FL>(
    cfg: &ScenarioConfig,
    env: Arc<StressEnvironment>,
    seed: Option<u64>,
    mut load_gate: FL,
) -> Result<Scenario, StressError>
where
    FL: FnMut(&LoadGateConfig) -> Result<LoadGateParts, StressError>,
{
    cfg.validate()?;
    env.validate()?;

    let mut pools = Vec::new();
    for (index, pool_cfg) in cfg.pool_configs().into_iter().enumerate() {
        let workload = workload_for(cfg, &pool_cfg, &env)?;
        let rng = seed.map_or_else(StdRandom::from_os, |s| {
            StdRandom::seeded(s.wrapping_add(index as u64))
        });
        pools.push(CyclicPoolPolicy::new(pool_cfg, workload, rng)?);
    }

    let mut policies: Vec<Box<dyn SchedulingPolicy>> = pools
        .iter()
        .map(|pool| Box::new(pool.clone()) as Box<dyn SchedulingPolicy>)
        .collect();

    policies.push(Box::new(InfrastructurePolicy::immediately(Infrastructure::monitor(&env))));
    for relay in &env.relays {
        policies.push(Box::new(InfrastructurePolicy::immediately(Infrastructure::relay(
            relay,
            &env,
            cfg.profile_relays,
        ))));
    }

    if let Some(max_time) = cfg.max_time() {
        policies.push(Box::new(TerminationPolicy::after(max_time)));
    }

    let ramp_up = match cfg.ramp_up_config() {
        Some(ramp_cfg) => {
            let (source, log) = load_gate(&cfg.load_gate)?;
            let task = pools
                .iter()
                .fold(LoadAdaptive::new(ramp_cfg, source, log)?, |task, pool| task.watch(pool));
            let policy = LoadAdaptivePolicy::ramp_up(task);
            policies.push(Box::new(policy.clone()));
            Some(policy)
        }
        None => None,
    };

    Ok(Scenario {
        pools,
        ramp_up,
        policies,
    })
}

impl Scenario {
    /// Interval of the ramp-up policy, if any.
    pub fn ramp_up_interval(&self) -> Option<Duration> {
        self.ramp_up.as_ref().map(LoadAdaptivePolicy::interval)
    }
}

//! Scenario-level configuration: slot counts, ramp-up gate, run time.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::pool::{CyclicPoolConfig, DEFAULT_STOP_MARGIN_MS};
use crate::core::StressError;

const fn default_interval_secs() -> u64 {
    10
}

const fn default_one_min_ceiling() -> f64 {
    0.70
}

const fn default_five_min_ceiling() -> f64 {
    0.80
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("load.csv")
}

const fn default_stop_margin_ms() -> u64 {
    DEFAULT_STOP_MARGIN_MS
}

/// Load-average gate for adaptive ramp-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadGateConfig {
    /// Seconds between load samples.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Highest per-core 1-minute load that still allows growth.
    #[serde(default = "default_one_min_ceiling")]
    pub one_min_ceiling: f64,
    /// Highest per-core 5-minute load that still allows growth.
    #[serde(default = "default_five_min_ceiling")]
    pub five_min_ceiling: f64,
    /// CSV file receiving one row per sample.
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
}

impl Default for LoadGateConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            one_min_ceiling: default_one_min_ceiling(),
            five_min_ceiling: default_five_min_ceiling(),
            csv_path: default_csv_path(),
        }
    }
}

impl LoadGateConfig {
    /// Validate interval and ceilings.
    pub fn validate(&self) -> Result<(), StressError> {
        if self.interval_secs == 0 {
            return Err(StressError::InvalidConfig(
                "load gate interval_secs must be greater than 0".into(),
            ));
        }
        for (name, ceiling) in [
            ("one_min_ceiling", self.one_min_ceiling),
            ("five_min_ceiling", self.five_min_ceiling),
        ] {
            if !ceiling.is_finite() || ceiling < 0.0 {
                return Err(StressError::InvalidConfig(format!(
                    "load gate {name} must be a non-negative number, got {ceiling}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything the load-adaptive policy needs, resolved from a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct RampUpConfig {
    /// Seconds between samples.
    pub interval: Duration,
    /// Per-core 1-minute ceiling.
    pub one_min_ceiling: f64,
    /// Per-core 5-minute ceiling.
    pub five_min_ceiling: f64,
    /// Slots added per pool on each permitted step.
    pub increment: u64,
    /// Slot count each pool starts with.
    pub initial_slots: u64,
    /// Upper bound on the slot count; `None` is unlimited.
    pub max_slots: Option<u64>,
}

impl RampUpConfig {
    /// Validate increment, ceilings and bounds.
    pub fn validate(&self) -> Result<(), StressError> {
        if self.increment == 0 {
            return Err(StressError::InvalidConfig(
                "ramp-up increment must be greater than 0".into(),
            ));
        }
        if self.interval.is_zero() {
            return Err(StressError::InvalidConfig(
                "ramp-up interval must be greater than 0".into(),
            ));
        }
        if !(self.one_min_ceiling.is_finite() && self.five_min_ceiling.is_finite()) {
            return Err(StressError::InvalidConfig("load ceilings must be finite".into()));
        }
        Ok(())
    }
}

/// Root scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Fixed slot count per pool. With ramp-up this is the maximum, 0 meaning
    /// unlimited.
    pub count: u64,
    /// Ramp-up increment; 0 disables adaptive ramp-up.
    #[serde(default)]
    pub ramp_up: u64,
    /// Wall-clock limit in seconds; 0 runs until interrupted.
    #[serde(default)]
    pub max_time_secs: u64,
    /// Run the sleeper workload instead of publishers and subscribers.
    #[serde(default)]
    pub dummy: bool,
    /// Run relays under the mutrace lock profiler.
    #[serde(default)]
    pub profile_relays: bool,
    /// Ramp-up gate.
    #[serde(default)]
    pub load_gate: LoadGateConfig,
    /// Margin between a cycle's run time and its stop event.
    #[serde(default = "default_stop_margin_ms")]
    pub stop_margin_ms: u64,
    /// External command that provisions identities and permissions before
    /// anything is scheduled. Empty to skip.
    #[serde(default)]
    pub provision_command: Vec<String>,
    /// Explicit pools replacing the built-in workload presets.
    #[serde(default)]
    pub pools: Option<Vec<CyclicPoolConfig>>,
}

impl ScenarioConfig {
    /// Scenario with `count` slots per pool and defaults elsewhere.
    pub fn new(count: u64) -> Self {
        Self {
            count,
            ramp_up: 0,
            max_time_secs: 0,
            dummy: false,
            profile_relays: false,
            load_gate: LoadGateConfig::default(),
            stop_margin_ms: DEFAULT_STOP_MARGIN_MS,
            provision_command: Vec::new(),
            pools: None,
        }
    }

    /// Slots each pool schedules at start: the ramp-up increment when ramping
    /// up, otherwise the fixed count.
    pub const fn initial_slots(&self) -> u64 {
        if self.ramp_up > 0 {
            self.ramp_up
        } else {
            self.count
        }
    }

    /// Ramp-up settings, or `None` when ramp-up is disabled.
    pub fn ramp_up_config(&self) -> Option<RampUpConfig> {
        (self.ramp_up > 0).then(|| RampUpConfig {
            interval: Duration::from_secs(self.load_gate.interval_secs),
            one_min_ceiling: self.load_gate.one_min_ceiling,
            five_min_ceiling: self.load_gate.five_min_ceiling,
            increment: self.ramp_up,
            initial_slots: self.initial_slots(),
            max_slots: (self.count > 0).then_some(self.count),
        })
    }

    /// Wall-clock limit, or `None` to run until interrupted.
    pub fn max_time(&self) -> Option<Duration> {
        (self.max_time_secs > 0).then(|| Duration::from_secs(self.max_time_secs))
    }

    /// Pools to run: explicit pools if given, else the workload presets.
    pub fn pool_configs(&self) -> Vec<CyclicPoolConfig> {
        if let Some(pools) = &self.pools {
            return pools.clone();
        }
        let initial = self.initial_slots();
        let presets = if self.dummy {
            vec![CyclicPoolConfig::dummy(initial)]
        } else {
            vec![
                CyclicPoolConfig::publisher(initial),
                CyclicPoolConfig::subscriber(initial),
            ]
        };
        presets
            .into_iter()
            .map(|pool| pool.with_stop_margin_ms(self.stop_margin_ms))
            .collect()
    }

    /// Validate the scenario and every pool it would run.
    pub fn validate(&self) -> Result<(), StressError> {
        if self.count == 0 && self.ramp_up == 0 {
            return Err(StressError::InvalidConfig(
                "count must be greater than 0 unless ramp-up is enabled".into(),
            ));
        }
        if self.ramp_up > 0 && self.count > 0 && self.ramp_up > self.count {
            return Err(StressError::InvalidConfig(format!(
                "ramp-up increment {} exceeds the maximum count {}",
                self.ramp_up, self.count
            )));
        }
        self.load_gate.validate()?;
        let pools = self.pool_configs();
        if pools.is_empty() {
            return Err(StressError::InvalidConfig("at least one pool must be defined".into()));
        }
        for pool in &pools {
            pool.validate()?;
            if self.ramp_up > 0 && self.count > 0 && pool.initial_slots > self.count {
                return Err(StressError::InvalidConfig(format!(
                    "pool `{}` starts with {} slots, above the maximum count {}",
                    pool.name, pool.initial_slots, self.count
                )));
            }
        }
        Ok(())
    }

    /// Parse a scenario from a JSON string and validate it.
    pub fn from_json_str(input: &str) -> Result<Self, StressError> {
        let cfg: Self = serde_json::from_str(input)
            .map_err(|e| StressError::InvalidConfig(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

//! Load-gated ramp-up of cyclic pools.
//!
//! Every interval the system load average is sampled. While both the 1- and
//! 5-minute per-core averages stay at or below their ceilings, every watched
//! pool grows by the configured increment, up to the optional maximum. Each
//! sample is appended to a CSV log whatever the decision.

use std::io::Write;

use tracing::info;

use crate::config::RampUpConfig;
use crate::core::{EventLoop, ProcessGroupManager, StressError};
use crate::policy::cyclic::{CyclicPoolPolicy, WeakPool};
use crate::policy::oneshot::{OneShotPolicy, OneShotTask, Rearm};

/// Header row of the load log.
pub const LOAD_CSV_HEADER: &str = "elapsed_seconds,one_min_load,five_min_load,slot_count";

/// Load averages divided by the number of usable cores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSample {
    /// 1-minute average per core.
    pub one_minute: f64,
    /// 5-minute average per core.
    pub five_minute: f64,
    /// 15-minute average per core.
    pub fifteen_minute: f64,
}

impl LoadSample {
    /// Sample from raw averages and a core count; zero cores count as one.
    pub fn per_core(raw: [f64; 3], cores: usize) -> Self {
        let cores = cores.max(1) as f64;
        Self {
            one_minute: raw[0] / cores,
            five_minute: raw[1] / cores,
            fifteen_minute: raw[2] / cores,
        }
    }
}

/// Where load samples come from.
pub trait LoadSource {
    /// Current per-core load. Failure ends the run.
    fn sample(&mut self) -> Result<LoadSample, StressError>;
}

/// Outcome of one ramp-up check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampDecision {
    /// Pools grew by `by` slots each, to `total`.
    Increased {
        /// Slots added per pool.
        by: u64,
        /// Slot count per pool afterwards.
        total: u64,
    },
    /// Load allowed growth but the maximum is already reached.
    MaxReached {
        /// Slot count per pool.
        total: u64,
    },
    /// Load is above a ceiling; nothing changes.
    AtLoadLimit {
        /// Observed 1-minute load.
        one_minute: f64,
        /// Observed 5-minute load.
        five_minute: f64,
    },
}

/// Ramp-up task driven by a [`LoadAdaptivePolicy`].
pub struct LoadAdaptive {
    config: RampUpConfig,
    source: Box<dyn LoadSource>,
    log: Box<dyn Write>,
    pools: Vec<WeakPool>,
    slot_count: u64,
    last: Option<RampDecision>,
}

impl LoadAdaptive {
    /// Create the task. `log` receives CSV rows; it gets no header from here.
    pub fn new(
        config: RampUpConfig,
        source: Box<dyn LoadSource>,
        log: Box<dyn Write>,
    ) -> Result<Self, StressError> {
        config.validate()?;
        let slot_count = config.initial_slots;
        Ok(Self {
            config,
            source,
            log,
            pools: Vec::new(),
            slot_count,
            last: None,
        })
    }

    /// Grow `pool` along with the others. The pool is not kept alive.
    #[must_use]
    pub fn watch(mut self, pool: &CyclicPoolPolicy) -> Self {
        self.pools.push(pool.downgrade());
        self
    }

    /// Slot count of the largest watched pool as of the last firing, or the
    /// count tracked here once every pool is gone.
    pub const fn slot_count(&self) -> u64 {
        self.slot_count
    }

    /// Decision taken by the most recent firing.
    pub const fn last_decision(&self) -> Option<RampDecision> {
        self.last
    }

    /// Apply the gate to `sample` and update the tracked slot count.
    ///
    /// An increment that would overshoot the maximum is cut to land on it.
    pub fn decide(&mut self, sample: LoadSample) -> RampDecision {
        let cfg = &self.config;
        if sample.one_minute > cfg.one_min_ceiling || sample.five_minute > cfg.five_min_ceiling {
            return RampDecision::AtLoadLimit {
                one_minute: sample.one_minute,
                five_minute: sample.five_minute,
            };
        }
        let room = cfg
            .max_slots
            .map_or(u64::MAX, |max| max.saturating_sub(self.slot_count));
        if room == 0 {
            return RampDecision::MaxReached {
                total: self.slot_count,
            };
        }
        let by = cfg.increment.min(room);
        self.slot_count += by;
        RampDecision::Increased {
            by,
            total: self.slot_count,
        }
    }
}

impl OneShotTask for LoadAdaptive {
    fn label(&self) -> String {
        "load ramp-up".into()
    }

    fn fire(
        &mut self,
        event_loop: &mut EventLoop,
        _: &ProcessGroupManager,
    ) -> Result<Rearm, StressError> {
        let pools: Vec<_> = self.pools.iter().filter_map(WeakPool::upgrade).collect();
        if let Some(largest) = pools.iter().map(CyclicPoolPolicy::slot_count).max() {
            self.slot_count = largest;
        }
        let sample = self.source.sample()?;
        let decision = self.decide(sample);
        match decision {
            RampDecision::Increased { by, total } => {
                info!("Increase count to {total}");
                for pool in &pools {
                    let room = total.saturating_sub(pool.slot_count()).min(by);
                    if room > 0 {
                        pool.increase_slot_count(event_loop, room, true)?;
                    }
                }
            }
            RampDecision::MaxReached { total } => info!("Max count reached: {total}"),
            RampDecision::AtLoadLimit {
                one_minute,
                five_minute,
            } => info!("Currently at load limit: {one_minute:.2} {five_minute:.2}"),
        }
        self.last = Some(decision);

        let row = format!(
            "{:.3},{:.2},{:.2},{}",
            event_loop.now().as_secs_f64(),
            sample.one_minute,
            sample.five_minute,
            self.slot_count
        );
        info!("{}", row.replace(',', " "));
        writeln!(self.log, "{row}")?;
        self.log.flush()?;
        Ok(Rearm::Again)
    }
}

impl OneShotPolicy<LoadAdaptive> {
    /// Run `task` every configured interval.
    pub fn ramp_up(task: LoadAdaptive) -> Self {
        let interval = task.config.interval;
        Self::new(interval, task)
    }
}

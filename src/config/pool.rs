//! Cyclic pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::StressError;

/// Default gap between a slot's drawn run time and its stop event.
pub const DEFAULT_STOP_MARGIN_MS: u64 = 2_000;

const fn default_first_slot() -> u64 {
    1
}

const fn default_stop_margin_ms() -> u64 {
    DEFAULT_STOP_MARGIN_MS
}

/// Ranges and odds for one pool of recurring slots. All times are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyclicPoolConfig {
    /// Pool name used in logs.
    pub name: String,
    /// Lowest slot id the pool allocates.
    #[serde(default = "default_first_slot")]
    pub first_slot: u64,
    /// Slots scheduled when the pool becomes ready.
    pub initial_slots: u64,
    /// Minimum delay before a slot's next start.
    #[serde(default)]
    pub min_start_secs: u64,
    /// Maximum delay before a slot's next start.
    #[serde(default)]
    pub max_start_secs: u64,
    /// Minimum run time of one cycle.
    pub min_duration_secs: u64,
    /// Maximum run time of one cycle.
    pub max_duration_secs: u64,
    /// Probability that a cycle ends with SIGKILL instead of SIGINT.
    #[serde(default)]
    pub kill_chance: f64,
    /// Extra time between the drawn run time and the stop event.
    #[serde(default = "default_stop_margin_ms")]
    pub stop_margin_ms: u64,
}

impl CyclicPoolConfig {
    /// Pool with the given name and run-time range, starting immediately,
    /// never killing.
    pub fn new(
        name: impl Into<String>,
        initial_slots: u64,
        min_duration_secs: u64,
        max_duration_secs: u64,
    ) -> Self {
        Self {
            name: name.into(),
            first_slot: default_first_slot(),
            initial_slots,
            min_start_secs: 0,
            max_start_secs: 0,
            min_duration_secs,
            max_duration_secs,
            kill_chance: 0.0,
            stop_margin_ms: DEFAULT_STOP_MARGIN_MS,
        }
    }

    /// Trivial sleeper workload: start within 1..=5 s, run 1..=10 s.
    pub fn dummy(initial_slots: u64) -> Self {
        Self::new("dummy", initial_slots, 1, 10).with_start_range(1, 5)
    }

    /// Publishers: long-lived, killed one time in ten.
    pub fn publisher(initial_slots: u64) -> Self {
        Self::new("publisher", initial_slots, 100, 500).with_kill_chance(0.1)
    }

    /// Subscribers: short-lived, killed half of the time.
    pub fn subscriber(initial_slots: u64) -> Self {
        Self::new("subscriber", initial_slots, 2, 10).with_kill_chance(0.5)
    }

    /// Set the start delay range.
    #[must_use]
    pub const fn with_start_range(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.min_start_secs = min_secs;
        self.max_start_secs = max_secs;
        self
    }

    /// Set the kill probability.
    #[must_use]
    pub const fn with_kill_chance(mut self, kill_chance: f64) -> Self {
        self.kill_chance = kill_chance;
        self
    }

    /// Set the stop margin.
    #[must_use]
    pub const fn with_stop_margin_ms(mut self, stop_margin_ms: u64) -> Self {
        self.stop_margin_ms = stop_margin_ms;
        self
    }

    /// Stop margin as a duration.
    pub const fn stop_margin(&self) -> Duration {
        Duration::from_millis(self.stop_margin_ms)
    }

    /// Validate ranges and odds.
    pub fn validate(&self) -> Result<(), StressError> {
        let invalid =
            |msg: String| Err(StressError::InvalidConfig(format!("pool `{}`: {msg}", self.name)));
        if self.name.is_empty() {
            return Err(StressError::InvalidConfig("pool name must not be empty".into()));
        }
        if self.max_duration_secs < self.min_duration_secs {
            return invalid(format!(
                "max_duration_secs {} is below min_duration_secs {}",
                self.max_duration_secs, self.min_duration_secs
            ));
        }
        if self.max_start_secs < self.min_start_secs {
            return invalid(format!(
                "max_start_secs {} is below min_start_secs {}",
                self.max_start_secs, self.min_start_secs
            ));
        }
        if !(0.0..=1.0).contains(&self.kill_chance) {
            return invalid(format!("kill_chance {} is outside 0..=1", self.kill_chance));
        }
        if self.min_duration_secs == 0 && self.stop_margin_ms == 0 {
            return invalid("a zero run time needs a non-zero stop margin".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for cfg in [
            CyclicPoolConfig::dummy(3),
            CyclicPoolConfig::publisher(3),
            CyclicPoolConfig::subscriber(3),
        ] {
            assert!(cfg.validate().is_ok(), "{} invalid", cfg.name);
        }
    }

    #[test]
    fn test_inverted_ranges_rejected() {
        assert!(CyclicPoolConfig::new("p", 1, 5, 4).validate().is_err());
        assert!(CyclicPoolConfig::new("p", 1, 1, 1)
            .with_start_range(3, 2)
            .validate()
            .is_err());
    }

    #[test]
    fn test_kill_chance_bounds() {
        assert!(CyclicPoolConfig::new("p", 1, 1, 1).with_kill_chance(1.5).validate().is_err());
        assert!(CyclicPoolConfig::new("p", 1, 1, 1).with_kill_chance(f64::NAN).validate().is_err());
        assert!(CyclicPoolConfig::new("p", 1, 1, 1).with_kill_chance(1.0).validate().is_ok());
    }

    #[test]
    fn test_zero_duration_needs_margin() {
        let cfg = CyclicPoolConfig::new("p", 1, 0, 0).with_stop_margin_ms(0);
        assert!(cfg.validate().is_err());
        assert!(cfg.with_stop_margin_ms(1).validate().is_ok());
    }
}

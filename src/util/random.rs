//! Injectable randomness for scheduling decisions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the random draws a policy makes.
pub trait RandomSource {
    /// Uniform integer in `lo..=hi`. Callers guarantee `lo <= hi`.
    fn int_in(&mut self, lo: u64, hi: u64) -> u64;
    /// True with probability `p`, where `0.0 <= p <= 1.0`.
    fn chance(&mut self, p: f64) -> bool;
    /// Uniform index in `0..len`. Callers guarantee `len > 0`.
    fn pick(&mut self, len: usize) -> usize;
}

/// [`RandomSource`] backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Seed from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence for tests and dry runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn int_in(&mut self, lo: u64, hi: u64) -> u64 {
        self.rng.random_range(lo..=hi)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.rng.random::<f64>() < p
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

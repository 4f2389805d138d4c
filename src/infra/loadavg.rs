//! Load sources.

use crate::core::StressError;
use crate::policy::{LoadSample, LoadSource};

/// Host load average from `getloadavg(3)`, divided by the usable core count.
#[derive(Debug, Clone, Copy)]
pub struct SystemLoad {
    cores: usize,
}

impl Default for SystemLoad {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemLoad {
    /// Normalize by the cores this process may run on.
    pub fn new() -> Self {
        Self {
            cores: num_cpus::get(),
        }
    }

    /// Cores used for normalization.
    pub const fn cores(&self) -> usize {
        self.cores
    }
}

impl LoadSource for SystemLoad {
    fn sample(&mut self) -> Result<LoadSample, StressError> {
        let mut raw = [0.0_f64; 3];
        // SAFETY: `raw` holds exactly the three samples requested.
        #[allow(unsafe_code)]
        let filled = unsafe { libc::getloadavg(raw.as_mut_ptr(), 3) };
        if filled < 3 {
            return Err(StressError::LoadAverage(format!(
                "getloadavg returned {filled} of 3 samples"
            )));
        }
        Ok(LoadSample::per_core(raw, self.cores))
    }
}

/// Constant load, for dry runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedLoad(pub LoadSample);

impl LoadSource for FixedLoad {
    fn sample(&mut self) -> Result<LoadSample, StressError> {
        Ok(self.0)
    }
}

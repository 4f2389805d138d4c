//! Launcher that records requests instead of touching the OS.
//!
//! Used by dry runs and tests: pids are handed out sequentially from 1000.

use std::collections::HashSet;
use std::io;

use parking_lot::Mutex;

use crate::core::{GroupSignal, LaunchSpec, ProcessLauncher, StressError};

const FIRST_PID: u32 = 1000;

struct Recorded {
    next_pid: u32,
    spawned: Vec<LaunchSpec>,
    signals: Vec<(u32, GroupSignal)>,
    failing: HashSet<String>,
}

/// In-memory [`ProcessLauncher`].
pub struct RecordingLauncher {
    inner: Mutex<Recorded>,
}

impl Default for RecordingLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingLauncher {
    /// Launcher with nothing recorded.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Recorded {
                next_pid: FIRST_PID,
                spawned: Vec::new(),
                signals: Vec::new(),
                failing: HashSet::new(),
            }),
        }
    }

    /// Make every spawn of `program` fail as if it did not exist.
    pub fn fail_program(&self, program: &str) {
        self.inner.lock().failing.insert(program.to_string());
    }

    /// Specs spawned so far, in order.
    pub fn spawned(&self) -> Vec<LaunchSpec> {
        self.inner.lock().spawned.clone()
    }

    /// Signals delivered so far, in order.
    pub fn signals(&self) -> Vec<(u32, GroupSignal)> {
        self.inner.lock().signals.clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn spawn(&self, spec: &LaunchSpec) -> Result<u32, StressError> {
        let mut inner = self.inner.lock();
        if inner.failing.contains(&spec.program) {
            return Err(StressError::Spawn {
                nick: spec.nick.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, spec.program.clone()),
            });
        }
        let pid = inner.next_pid;
        inner.next_pid += 1;
        inner.spawned.push(spec.clone());
        Ok(pid)
    }

    fn signal_group(&self, pid: u32, signal: GroupSignal) -> Result<(), StressError> {
        self.inner.lock().signals.push((pid, signal));
        Ok(())
    }
}

//! Process launcher backed by the operating system.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command};

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::{GroupSignal, LaunchSpec, ProcessLauncher, StressError};

/// Spawns children as process-group leaders and signals them with `killpg`.
///
/// Child handles are kept so exited children are reaped instead of piling
/// up as zombies over a long run. Only children whose group has been
/// signalled are reaped: an unsignalled child that exits stays a zombie, so
/// its pid cannot be handed to a new worker while the manager still tracks
/// it, and its group stays signalable.
#[derive(Default)]
pub struct OsProcessLauncher {
    children: Mutex<Children>,
}

#[derive(Default)]
struct Children {
    running: HashMap<u32, Child>,
    signalled: HashMap<u32, Child>,
}

impl OsProcessLauncher {
    /// Launcher with no children.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect exit statuses of signalled children. Returns how many exited.
    pub fn reap(&self) -> usize {
        let mut children = self.children.lock();
        let before = children.signalled.len();
        children.signalled.retain(|pid, child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid, %status, "child exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(pid, "wait failed: {e}");
                false
            }
        });
        before - children.signalled.len()
    }

    /// Children not yet reaped, signalled or not.
    pub fn live_count(&self) -> usize {
        let children = self.children.lock();
        children.running.len() + children.signalled.len()
    }
}

fn remove_stale(path: &std::path::Path) -> Result<(), StressError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl ProcessLauncher for OsProcessLauncher {
    fn spawn(&self, spec: &LaunchSpec) -> Result<u32, StressError> {
        self.reap();
        if let Some(log) = &spec.fresh_log {
            remove_stale(log)?;
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .process_group(0);
        if let Some(path) = &spec.stderr_to {
            cmd.stderr(File::create(path)?);
        }
        let child = cmd.spawn().map_err(|source| StressError::Spawn {
            nick: spec.nick.clone(),
            source,
        })?;
        let pid = child.id();
        self.children.lock().running.insert(pid, child);
        Ok(pid)
    }

    fn signal_group(&self, pid: u32, signal: GroupSignal) -> Result<(), StressError> {
        let raw = i32::try_from(pid).map_err(|_| StressError::Signal {
            pid,
            reason: "pid out of range".into(),
        })?;
        let sig = match signal {
            GroupSignal::Interrupt => Signal::SIGINT,
            GroupSignal::Kill => Signal::SIGKILL,
        };
        let delivered = killpg(Pid::from_raw(raw), sig);
        let mut children = self.children.lock();
        if let Some(child) = children.running.remove(&pid) {
            children.signalled.insert(pid, child);
        }
        drop(children);
        delivered.map_err(|e| StressError::Signal {
            pid,
            reason: match e {
                Errno::ESRCH => "process group already gone".into(),
                e => e.to_string(),
            },
        })
    }
}

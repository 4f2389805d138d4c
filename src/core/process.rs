//! Process-group lifecycle management.
//!
//! Every child is started as the leader of its own process group so a single
//! signal reaches it and anything it spawned. The manager keeps the pid table
//! behind a mutex because the signal-driven cleanup path runs on the signal
//! handler's thread; the scheduling thread is the only other user.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::core::activity::{ActivityAction, ActivityRecord, ActivitySink};
use crate::core::{LaunchSpec, StressError};
use crate::util::clock::{Clock, SystemClock};

/// Signal delivered to a whole process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupSignal {
    /// SIGINT: the worker is expected to shut down in order.
    Interrupt,
    /// SIGKILL: immediate termination.
    Kill,
}

impl GroupSignal {
    const fn activity(self) -> ActivityAction {
        match self {
            Self::Interrupt => ActivityAction::Interrupt,
            Self::Kill => ActivityAction::Kill,
        }
    }
}

impl fmt::Display for GroupSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Kill => "SIGKILL",
        })
    }
}

/// Starts processes and delivers group signals on behalf of the manager.
pub trait ProcessLauncher: Send + Sync {
    /// Start `spec` as the leader of a new process group and return its pid.
    fn spawn(&self, spec: &LaunchSpec) -> Result<u32, StressError>;
    /// Deliver `signal` to the process group led by `pid`.
    fn signal_group(&self, pid: u32, signal: GroupSignal) -> Result<(), StressError>;
}

/// A child the manager believes is still controllable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedProcess {
    /// Process id, also the process group id.
    pub pid: u32,
    /// Nickname used in logs.
    pub nick: String,
    /// Program followed by its arguments.
    pub args: Vec<String>,
}

/// Spawns, tracks and signals worker process groups.
///
/// Cheap to clone; clones share the same pid table.
#[derive(Clone)]
pub struct ProcessGroupManager {
    launcher: Arc<dyn ProcessLauncher>,
    procs: Arc<Mutex<HashMap<u32, TrackedProcess>>>,
    activity: Option<Arc<Mutex<dyn ActivitySink>>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl ProcessGroupManager {
    /// Create a manager using `launcher` for all OS interaction.
    pub fn new(launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            procs: Arc::new(Mutex::new(HashMap::new())),
            activity: None,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Stamp activity records with `clock` instead of wall time since
    /// construction.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Attach an activity sink.
    #[must_use]
    pub fn with_activity(mut self, sink: Arc<Mutex<dyn ActivitySink>>) -> Self {
        self.activity = Some(sink);
        self
    }

    fn record(&self, action: ActivityAction, tracked: &TrackedProcess) {
        if let Some(sink) = &self.activity {
            sink.lock().record(ActivityRecord {
                elapsed: self.clock.now(),
                action,
                nick: tracked.nick.clone(),
                pid: tracked.pid,
                args: tracked.args.clone(),
            });
        }
    }

    /// Start `spec` in a new process group and track it.
    ///
    /// Spawn failures are returned as-is; nothing is retried. The pid table
    /// stays locked from spawn to insert, so a concurrent
    /// [`interrupt_all`](Self::interrupt_all) either sees the new group or
    /// runs before it exists.
    pub fn run(&self, spec: &LaunchSpec) -> Result<TrackedProcess, StressError> {
        let mut procs = self.procs.lock();
        let pid = self.launcher.spawn(spec)?;
        let tracked = TrackedProcess {
            pid,
            nick: spec.nick.clone(),
            args: spec.command_line(),
        };
        info!(pid, "RUN {} {:?}", tracked.nick, tracked.args);
        if let Some(stale) = procs.insert(pid, tracked.clone()) {
            warn!(pid, "pid reused while `{}` was still tracked", stale.nick);
        }
        drop(procs);
        self.record(ActivityAction::Run, &tracked);
        Ok(tracked)
    }

    /// Stop tracking `pid` and send `signal` to its process group.
    ///
    /// An untracked pid means the process was already stopped once, which
    /// is a scheduling bug; it is reported rather than ignored.
    pub fn signal_group(&self, pid: u32, signal: GroupSignal) -> Result<(), StressError> {
        let tracked = self
            .procs
            .lock()
            .remove(&pid)
            .ok_or(StressError::UntrackedProcess(pid))?;
        info!(pid, "{signal} {} {:?}", tracked.nick, tracked.args);
        self.record(signal.activity(), &tracked);
        self.launcher.signal_group(pid, signal)
    }

    /// Force-kill the group led by `pid`.
    pub fn kill(&self, pid: u32) -> Result<(), StressError> {
        self.signal_group(pid, GroupSignal::Kill)
    }

    /// Interrupt the group led by `pid`.
    pub fn interrupt(&self, pid: u32) -> Result<(), StressError> {
        self.signal_group(pid, GroupSignal::Interrupt)
    }

    /// Interrupt every tracked group and return how many were signalled.
    ///
    /// Each pid is removed before it is signalled, so a process is never
    /// interrupted twice even if this runs concurrently with a slot stop or
    /// is invoked again after a partial teardown.
    pub fn interrupt_all(&self) -> usize {
        info!("INT ALL START");
        let pids: Vec<u32> = self.procs.lock().keys().copied().collect();
        let mut signalled = 0;
        for pid in pids {
            match self.interrupt(pid) {
                Ok(()) => signalled += 1,
                Err(StressError::UntrackedProcess(_)) => {}
                Err(e) => {
                    signalled += 1;
                    warn!(pid, "interrupt during cleanup failed: {e}");
                }
            }
        }
        info!(signalled, "INT ALL END");
        signalled
    }

    /// Guard that interrupts every tracked group when dropped.
    pub fn cleanup_guard(&self) -> CleanupGuard {
        CleanupGuard {
            manager: self.clone(),
        }
    }

    /// Number of tracked processes.
    pub fn tracked_count(&self) -> usize {
        self.procs.lock().len()
    }

    /// Whether `pid` is tracked.
    pub fn is_tracked(&self, pid: u32) -> bool {
        self.procs.lock().contains_key(&pid)
    }

    /// Snapshot of tracked processes, ordered by pid.
    pub fn tracked(&self) -> Vec<TrackedProcess> {
        let mut procs: Vec<_> = self.procs.lock().values().cloned().collect();
        procs.sort_by_key(|p| p.pid);
        procs
    }
}

/// Interrupts all tracked process groups on drop, on every exit path out
/// of the scope holding it, unwinding included.
pub struct CleanupGuard {
    manager: ProcessGroupManager,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.manager.interrupt_all();
    }
}

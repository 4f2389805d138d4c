//! Error types for scheduler operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// Nothing in the scheduler retries: every variant is surfaced to the caller
/// and, inside an event action, ends the event loop.
#[derive(Debug, Error)]
pub enum StressError {
    /// A configured value is out of bounds or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A file the launch contract requires is not on disk.
    #[error("missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),
    /// The OS refused to start a child process.
    #[error("failed to spawn `{nick}`: {source}")]
    Spawn {
        /// Nickname of the process that failed to start.
        nick: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A signal was requested for a pid the manager does not track.
    #[error("process {0} is not tracked")]
    UntrackedProcess(u32),
    /// A slot was stopped while no process was recorded for it.
    #[error("slot {slot} of pool `{pool}` has no running process")]
    SlotNotRunning {
        /// Pool name.
        pool: String,
        /// Slot identifier.
        slot: u64,
    },
    /// Delivering a signal to a process group failed.
    #[error("failed to signal process group of {pid}: {reason}")]
    Signal {
        /// Process id the signal was meant for.
        pid: u32,
        /// OS error description.
        reason: String,
    },
    /// The platform could not report its load average.
    #[error("load average unavailable: {0}")]
    LoadAverage(String),
    /// The process-wide termination handler could not be installed.
    #[error("failed to install termination handler: {0}")]
    SignalHandler(String),
    /// The external provisioning step did not succeed.
    #[error("provisioning failed: {0}")]
    Provision(String),
    /// I/O failure on a log or CSV file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

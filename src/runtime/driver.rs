//! Runs a scenario: provisioning, readying policies, driving the loop, and
//! making sure no process group outlives the scheduler.

use std::process::Command;
use std::time::Duration;

use tracing::{info, warn};

use crate::core::{EventLoop, LoopExit, ProcessGroupManager, StressError};
use crate::policy::SchedulingPolicy;

/// Exit status used after a termination signal, as a shell would report
/// SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Ready every policy in order, then run the loop.
///
/// Without `until` the loop runs until an action requests exit, fails, or
/// runs out of events. Tracked process groups are interrupted on every way
/// out of this function.
pub fn run_scenario(
    policies: &[Box<dyn SchedulingPolicy>],
    event_loop: &mut EventLoop,
    manager: &ProcessGroupManager,
    until: Option<Duration>,
) -> Result<LoopExit, StressError> {
    let _cleanup = manager.cleanup_guard();
    for policy in policies {
        info!(policy = policy.name(), "ready");
        policy.ready(event_loop, manager)?;
    }
    let exit = match until {
        Some(deadline) => event_loop.run_until(deadline),
        None => event_loop.run_forever(),
    };
    match &exit {
        Ok(reason) => info!(?reason, pending = event_loop.len(), "event loop stopped"),
        Err(e) => warn!(pending = event_loop.len(), "event loop failed: {e}"),
    }
    exit
}

/// Interrupt every tracked group and exit when SIGINT, SIGTERM or SIGHUP
/// arrives.
pub fn install_signal_cleanup(manager: &ProcessGroupManager) -> Result<(), StressError> {
    let manager = manager.clone();
    ctrlc::set_handler(move || {
        warn!("termination signal received");
        manager.interrupt_all();
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
    .map_err(|e| StressError::SignalHandler(e.to_string()))
}

/// Run the external provisioning command, if any, and wait for it.
pub fn run_provisioning(command: &[String]) -> Result<(), StressError> {
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };
    info!("provisioning: {}", command.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| StressError::Provision(format!("cannot run `{program}`: {e}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(StressError::Provision(format!(
            "`{}` exited with {status}",
            command.join(" ")
        )))
    }
}

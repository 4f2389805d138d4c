//! Scheduling policies.
//!
//! A policy turns configuration into events. [`SchedulingPolicy::ready`] is
//! called once, before the loop runs, and does the policy's initial
//! scheduling; everything after that happens inside event actions.

pub mod cyclic;
pub mod infrastructure;
pub mod oneshot;
pub mod ramp_up;
pub mod termination;
pub mod workload;

pub use cyclic::{CycleTimes, CyclicPoolPolicy, Slot, WeakPool};
pub use infrastructure::Infrastructure;
pub use oneshot::{OneShotPolicy, OneShotTask, Rearm};
pub use ramp_up::{LoadAdaptive, LoadSample, LoadSource, RampDecision, LOAD_CSV_HEADER};
pub use termination::Termination;
pub use workload::{ParticipantRole, Workload};

use crate::core::{EventLoop, ProcessGroupManager, StressError};

/// Common interface of everything the driver readies before the loop runs.
pub trait SchedulingPolicy {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Bind to `manager` and queue the initial events.
    fn ready(
        &self,
        event_loop: &mut EventLoop,
        manager: &ProcessGroupManager,
    ) -> Result<(), StressError>;
}

/// Grows cyclic pools while the system load allows.
pub type LoadAdaptivePolicy = OneShotPolicy<LoadAdaptive>;

/// Starts a relay or the monitor once.
pub type InfrastructurePolicy = OneShotPolicy<Infrastructure>;

/// Ends the run after a fixed time.
pub type TerminationPolicy = OneShotPolicy<Termination>;

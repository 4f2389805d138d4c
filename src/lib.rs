//! # Stress Scheduler
//!
//! A discrete-event scheduler that drives long-running relay stress tests.
//!
//! Worker processes are started, left running for a random time, and stopped
//! with SIGINT or SIGKILL, over and over, while support processes (relays and
//! a monitor) stay up for the whole run. Concurrency can grow on its own: a
//! ramp-up policy samples the host load average and adds slots while the
//! machine has headroom.
//!
//! ## Moving parts
//!
//! - [`core::EventLoop`]: a single-threaded priority queue of timed events.
//!   Every spawn, signal and load sample happens inside an event action.
//! - [`core::ProcessGroupManager`]: starts each child as its own process
//!   group, signals whole groups, and interrupts whatever is left on exit.
//! - [`policy`]: the scheduling policies. [`policy::CyclicPoolPolicy`] cycles
//!   numbered slots; one-shot policies start infrastructure, grow pools under
//!   a load gate, or end the run.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stress_scheduler::builders::{build_scenario, system_load_gate};
//! use stress_scheduler::config::{ScenarioConfig, StressEnvironment};
//! use stress_scheduler::core::{EventLoop, ProcessGroupManager};
//! use stress_scheduler::infra::OsProcessLauncher;
//! use stress_scheduler::runtime::run_scenario;
//! use stress_scheduler::util::SystemClock;
//!
//! let cfg = ScenarioConfig::new(10);
//! let env = Arc::new(StressEnvironment::from_process_env()?);
//! let scenario = build_scenario(&cfg, env, None, system_load_gate)?;
//! let manager = ProcessGroupManager::new(Arc::new(OsProcessLauncher::new()));
//! let mut event_loop = EventLoop::new(SystemClock::new());
//! run_scenario(&scenario.policies, &mut event_loop, &manager, None)?;
//! ```
//!
//! Tests and dry runs swap in [`util::SimulatedClock`] and
//! [`infra::RecordingLauncher`]; nothing else changes.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: events, the loop, process groups.
pub mod core;
/// Configuration models for scenarios, pools, and the launch environment.
pub mod config;
/// Builders to construct scenarios from configuration.
pub mod builders;
/// Adapters to the operating system.
pub mod infra;
/// Scheduling policies.
pub mod policy;
/// Scenario driver and signal handling.
pub mod runtime;
/// Shared utilities.
pub mod util;

//! Scenario driver and process-wide signal handling.

pub mod driver;

pub use driver::{install_signal_cleanup, run_provisioning, run_scenario, INTERRUPTED_EXIT_CODE};

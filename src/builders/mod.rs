//! Builders to construct scenarios from configuration.

pub mod scenario_builder;

pub use scenario_builder::{
    build_scenario, open_load_log, system_load_gate, LoadGateParts, Scenario,
};

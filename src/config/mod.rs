//! Configuration models for scenarios, pools, and the launch environment.

pub mod environment;
pub mod pool;
pub mod scenario;

pub use environment::{require_files, ArtifactLayout, RelayEndpoint, StressEnvironment};
pub use pool::{CyclicPoolConfig, DEFAULT_STOP_MARGIN_MS};
pub use scenario::{LoadGateConfig, RampUpConfig, ScenarioConfig};

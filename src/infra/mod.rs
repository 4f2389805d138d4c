//! Adapters to the operating system: process launchers and load sources.

pub mod loadavg;
pub mod os_launcher;
pub mod recording;

pub use loadavg::{FixedLoad, SystemLoad};
pub use os_launcher::OsProcessLauncher;
pub use recording::RecordingLauncher;

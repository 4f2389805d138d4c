//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::fmt::time::Uptime;
use tracing_subscriber::EnvFilter;

/// Initialize tracing. Users can install their own subscriber; this helper
/// installs an env-based subscriber if none is set.
///
/// Lines are stamped with the time elapsed since start. `RUST_LOG` wins over
/// `verbosity` (0 = info, 1 = debug, 2+ = trace).
pub fn init_tracing(verbosity: u8) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(Uptime::default())
        .with_target(false)
        .try_init();
}
